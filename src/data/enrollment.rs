/// The two read-only enrollment lookups, chosen by the segment after `iscrizioni`.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EnrollmentView {
    /// Enrollments of one student, joined with each course's title and teacher.
    ByStudent,
    /// Enrollments in one course, joined with each student's name and email.
    ByCourse,
}

impl EnrollmentView {
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "studente" => Some(Self::ByStudent),
            "corso" => Some(Self::ByCourse),
            _ => None,
        }
    }

    pub const fn query(self) -> &'static str {
        match self {
            Self::ByStudent => {
                "SELECT row_to_json(r) FROM (
                    SELECT i.*, c.titolo, c.docente
                    FROM iscrizioni i
                    JOIN corsi c ON i.corso_id = c.id
                    WHERE i.studente_id = $1
                    ORDER BY i.id
                ) r"
            }
            Self::ByCourse => {
                "SELECT row_to_json(r) FROM (
                    SELECT i.*, s.nome, s.cognome, s.email
                    FROM iscrizioni i
                    JOIN studenti s ON i.studente_id = s.id
                    WHERE i.corso_id = $1
                    ORDER BY i.id
                ) r"
            }
        }
    }
}
