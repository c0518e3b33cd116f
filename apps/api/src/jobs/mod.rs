// Job description analysis: keywords that steer refinement and the
// title/company pair used for document metadata.

pub mod analysis;
pub mod handlers;
pub mod prompts;
