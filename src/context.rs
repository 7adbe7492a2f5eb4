use std::collections::HashMap;

/// Named values set once per render and visible to every nested expansion.
pub type Globals = HashMap<String, String>;

/// An evaluated tag argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgumentValue {
    Named(String, String),
    Positional(String),
}

/// Named and positional arguments of one tag invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgumentContext {
    named: HashMap<String, String>,
    positional: Vec<String>,
}

impl ArgumentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind values in source order. A repeated name keeps its last value.
    pub fn from_values(values: impl IntoIterator<Item = ArgumentValue>) -> Self {
        let mut context = Self::new();
        for value in values {
            match value {
                ArgumentValue::Named(name, value) => {
                    context.named.insert(name, value);
                }
                ArgumentValue::Positional(value) => context.positional.push(value),
            }
        }
        context
    }

    pub fn named(&self, name: &str) -> Option<&str> {
        self.named.get(name).map(String::as_str)
    }

    /// 1-based positional lookup; index 0 is never bound.
    pub fn positional(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(1)
            .and_then(|i| self.positional.get(i))
            .map(String::as_str)
    }

    pub fn positional_args(&self) -> &[String] {
        &self.positional
    }
}

impl FromIterator<ArgumentValue> for ArgumentContext {
    fn from_iter<I: IntoIterator<Item = ArgumentValue>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

/// Lookup view over a local [`ArgumentContext`] layered on the [`Globals`].
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub arguments: &'a ArgumentContext,
    pub globals: &'a Globals,
}

impl<'a> Scope<'a> {
    pub fn new(arguments: &'a ArgumentContext, globals: &'a Globals) -> Self {
        Self { arguments, globals }
    }

    /// Local arguments shadow globals.
    pub fn named(&self, name: &str) -> Option<&'a str> {
        self.arguments
            .named(name)
            .or_else(|| self.globals.get(name).map(String::as_str))
    }

    pub fn has_named(&self, name: &str) -> bool {
        self.named(name).is_some()
    }

    pub fn positional(&self, index: usize) -> Option<&'a str> {
        self.arguments.positional(index)
    }

    pub fn positional_args(&self) -> &'a [String] {
        self.arguments.positional_args()
    }
}
