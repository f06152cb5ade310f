pub(crate) mod scoring;
pub(crate) mod targeting;
