pub mod application;
pub mod newsletter;
pub mod subscription;
pub mod whatsapp;

/// Record kinds mirrored between the remote database and the local JSON files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Application,
    WhatsApp,
    Newsletter,
}

impl RecordKind {
    pub fn table(self) -> &'static str {
        match self {
            RecordKind::Application => "applications",
            RecordKind::WhatsApp => "whatsapp_signups",
            RecordKind::Newsletter => "newsletter_signups",
        }
    }

    /// File name of the local fallback copy.
    pub fn file_name(self) -> &'static str {
        match self {
            RecordKind::Application => "applications.json",
            RecordKind::WhatsApp => "whatsapp_signups.json",
            RecordKind::Newsletter => "newsletter_signups.json",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.table())
    }
}
