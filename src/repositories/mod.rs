pub(crate) mod assignments;
pub(crate) mod attempts;
pub(crate) mod questions;
pub(crate) mod submissions;
pub(crate) mod tests;
pub(crate) mod users;
