/// Media types accepted as proof of payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofMediaType {
    Jpeg,
    Png,
    Pdf,
}

impl ProofMediaType {
    pub const ALL: [ProofMediaType; 3] = [Self::Jpeg, Self::Png, Self::Pdf];

    /// Match a declared `Content-Type`, ignoring case and parameters such as `; charset=`.
    pub fn from_mime(declared: &str) -> Option<Self> {
        let essence = declared.split(';').next().unwrap_or("").trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_mime().eq_ignore_ascii_case(essence))
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Pdf => "application/pdf",
        }
    }
}
