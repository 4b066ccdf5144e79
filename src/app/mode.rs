/// Top-level view the interactive loop is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppMode {
    /// Scrolling the history list
    #[default]
    List,
    /// Full-screen view of the item under the cursor
    Preview,
    Quit,
}
