pub mod algolia;
pub mod env;
pub mod error;
pub mod gemini;
pub mod storyblok;
