// ─── Launch Arguments ───
// Placeholder table and substitution for JVM and game arguments.

/// `${name}` -> value pairs applied to every composed argument.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderTable {
    entries: Vec<(&'static str, String)>,
}

impl PlaceholderTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, name: &'static str, value: impl Into<String>) -> Self {
        let value = value.into();
        match self.entries.iter_mut().find(|(key, _)| *key == name) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((name, value)),
        }
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn substitute(&self, arg: &str) -> String {
        if !arg.contains("${") {
            return arg.to_string();
        }
        self.entries
            .iter()
            .fold(arg.to_string(), |acc, (key, value)| {
                acc.replace(&format!("${{{key}}}"), value)
            })
    }

    /// Substitute every argument. One still holding `${...}` afterwards is
    /// dropped. A dropped value that is not itself a flag also takes the
    /// option flag right before it.
    pub fn apply(&self, raw_args: &[String]) -> Vec<String> {
        let mut resolved = Vec::with_capacity(raw_args.len());
        for arg in raw_args {
            let value = self.substitute(arg);
            if value.contains("${") {
                if !value.starts_with('-') {
                    drop_dangling_option(&mut resolved);
                }
                continue;
            }
            resolved.push(value);
        }
        resolved
    }
}

fn drop_dangling_option(args: &mut Vec<String>) {
    if args.last().is_some_and(|last| last.starts_with('-')) {
        let _ = args.pop();
    }
}
