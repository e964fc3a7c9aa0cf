// Shared prompt fragments. Per-field instructions live in extraction::fields.

/// Knowledge cutoff line of the Llama 3.1 system header.
pub const KNOWLEDGE_CUTOFF: &str = "Cutting Knowledge Date: December 2023";

/// Opens a Llama 3 system turn.
pub const LLAMA3_SYSTEM_OPEN: &str =
    "<|begin_of_text|><|start_header_id|>system<|end_header_id|>";

/// Closes the system turn and opens the user turn.
pub const LLAMA3_USER_OPEN: &str = "<|eot_id|><|start_header_id|>user<|end_header_id|>";

/// The extraction brief. Also used verbatim as the chat-style system message.
pub const EXTRACTOR_BRIEF: &str = "\
You are an expert resume extractor. Extract the following structured information from this resume:

1. Candidate Name & CNIC
2. Father's Name
3. Date of Birth (DOB)
4. SSC Field / %age
5. HSSC Field / %age
6. Graduation Field / CGPA / Passing Year
7. Courses
8. Experience Detail with Dates
9. Total Experience (in years and months)
10. Contact Number
11. Email
12. Address
";

/// Answer skeleton appended after the resume in completion-style prompts.
pub const REQUIRED_OUTPUTS: &str = "\
Required outputs (Just Mention the answer):

Candidate Name & CNIC: ...
Candidate Father's Name: ...
DOB: ...
SSC Field / %age: ...
HSSC Field / %age: ...
Graduation Field / CGPA / Passing Year: ...
Courses: ...
Experience Detail with Dates: ...
Total Experience: ...
Contact Number: ...
Email: ...
Address: ...
";

/// Suffix that tells the completion model to answer and nothing more.
pub const ANSWER_ONLY: &str = "(Mention the Answer only)";

/// Prefix placed before the resume text in chat-style user messages.
pub const CHAT_RESUME_PREFIX: &str = "Resume For the Candidate Name : ";
