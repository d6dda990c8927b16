#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Button {
    Text(String),
    RequestLocation(String),
}

impl Button {
    pub fn label(&self) -> &str {
        match self {
            Button::Text(label) | Button::RequestLocation(label) => label,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Keyboard {
    pub rows: Vec<Vec<Button>>,
    pub one_time: bool,
}

impl Keyboard {
    pub fn row(mut self, buttons: impl IntoIterator<Item = Button>) -> Self {
        self.rows.push(buttons.into_iter().collect());
        self
    }

    pub fn one_time(mut self) -> Self {
        self.one_time = true;
        self
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(Button::label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    pub fn with_keyboard(mut self, keyboard: Keyboard) -> Self {
        self.keyboard = Some(keyboard);
        self
    }
}
