pub mod headings;
pub mod import;
pub mod keywords;
pub mod notes;
pub mod report;
pub mod risk;
pub mod traits;

pub use import::PlainTextProcessor;
pub use keywords::KeywordCategorizer;
pub use notes::{populate_from_notes, NoteCollaborators, NotesImport};
pub use report::{parse_report, ReportImport, SectionMap};
pub use risk::{grade_risks, RiskGrading};
pub use traits::*;
