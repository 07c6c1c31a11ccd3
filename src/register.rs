/// Single yank slot shared by every yank, delete-with-yank and paste.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YankRegister {
    text: Option<String>,
}

impl YankRegister {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    pub fn get(&self) -> Option<&str> {
        self.text.as_deref().filter(|text| !text.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.get().is_none()
    }
}
