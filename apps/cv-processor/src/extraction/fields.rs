// The fixed field table: one entry per spreadsheet column after "Sr No".
// Order matters twice over: it is the column order, and it is the query order
// (Father's Name in completion style is derived from the Name answer).

/// Header of the serial-number column.
pub const SERIAL_COLUMN: &str = "Sr No";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    NameAndCnic,
    FatherName,
    DateOfBirth,
    Ssc,
    Hssc,
    Graduation,
    Courses,
    ExperienceDetail,
    TotalExperience,
    ContactNumber,
    Email,
    Address,
}

/// How the completion-style prompt for a field is built.
#[derive(Debug, Clone, Copy)]
pub enum CompletionQuery {
    /// Ask about `label` against the full resume prompt.
    FromResume(&'static str),
    /// Ask a resume-free question about an earlier answer.
    /// `{answer}` in the template is replaced by that field's value.
    FromField(Field, &'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub field: Field,
    pub column: &'static str,
    pub completion: CompletionQuery,
    /// User instruction for chat style. `{today}` is substituted.
    pub chat_instruction: &'static str,
}

pub const FIELDS: [FieldSpec; 12] = [
    FieldSpec {
        field: Field::NameAndCnic,
        column: "Candidate Name & CNIC No",
        completion: CompletionQuery::FromResume("Candidate Name & CNIC"),
        chat_instruction: "Give only 'Candidate Name & SCNIC' ",
    },
    FieldSpec {
        field: Field::FatherName,
        column: "Father's Name",
        completion: CompletionQuery::FromField(
            Field::NameAndCnic,
            "Extract the full second name from that name : {answer} ",
        ),
        chat_instruction: "From the Resume above, extract the Father's Name of the candidate",
    },
    FieldSpec {
        field: Field::DateOfBirth,
        column: "DOB",
        completion: CompletionQuery::FromResume("DOB"),
        chat_instruction: "Give only 'Date of Birth (DOB)'",
    },
    FieldSpec {
        field: Field::Ssc,
        column: "SSC Field / %age",
        completion: CompletionQuery::FromResume("SSC Field / %age"),
        chat_instruction: "Give only 'SSC Field / %age'",
    },
    FieldSpec {
        field: Field::Hssc,
        column: "HSSC Field / %age",
        completion: CompletionQuery::FromResume("HSSC Field / %age"),
        chat_instruction: "Give only 'HSSC Field / %age'",
    },
    FieldSpec {
        field: Field::Graduation,
        column: "Graduation Field / CGPA / Passing Year",
        completion: CompletionQuery::FromResume("Graduation Field / CGPA / Passing Year"),
        chat_instruction: "Give only 'Graduation Field / CGPA / Passing Year'",
    },
    FieldSpec {
        field: Field::Courses,
        column: "Courses",
        completion: CompletionQuery::FromResume("Courses"),
        chat_instruction: "Give only 'Courses or CERTIFICATIONS / PROFESSIONAL COURSES '",
    },
    FieldSpec {
        field: Field::ExperienceDetail,
        column: "Experience Detail with Dates",
        completion: CompletionQuery::FromResume("Experience Detail with Dates"),
        chat_instruction: "Give only '(Experience or Work Experience) Detail with Dates'",
    },
    FieldSpec {
        field: Field::TotalExperience,
        column: "Total Experience",
        completion: CompletionQuery::FromResume("Total Experience"),
        chat_instruction: "Give only 'Total Experience' and now today is {today}",
    },
    FieldSpec {
        field: Field::ContactNumber,
        column: "Contact Number",
        completion: CompletionQuery::FromResume("Contact Number"),
        chat_instruction:
            "Give only 'Contact Number or Phone Number From The First mentioned name in the Resume above'",
    },
    FieldSpec {
        field: Field::Email,
        column: "Email",
        completion: CompletionQuery::FromResume("Email"),
        chat_instruction: "Give only 'Email' From The First mentioned name in the Resume above",
    },
    FieldSpec {
        field: Field::Address,
        column: "Address",
        completion: CompletionQuery::FromResume("Address"),
        chat_instruction:
            "Give only 'Address or Home' From The First mentioned name in the Resume above",
    },
];

/// The 13-column spreadsheet header.
pub fn header() -> Vec<&'static str> {
    std::iter::once(SERIAL_COLUMN)
        .chain(FIELDS.iter().map(|spec| spec.column))
        .collect()
}
