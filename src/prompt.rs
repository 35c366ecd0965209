/// Source of values the caller did not supply, typically an interactive user.
///
/// The store only asks from [`crate::EnvStore::assign_with`]; the plain
/// operations never block on input.
pub trait Prompt {
    /// Ask for a value, offering `default` as the pre-filled answer.
    ///
    /// `None` means no value was produced and nothing should be stored.
    fn ask(&mut self, message: &str, default: Option<&str>) -> Option<String>;
}

impl<F> Prompt for F
where
    F: FnMut(&str, Option<&str>) -> Option<String>,
{
    fn ask(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        self(message, default)
    }
}
