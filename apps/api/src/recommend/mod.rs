// CV → job recommendations.
// Extracts CV text, asks the model for a JSON report, validates and ranks it.
// All model calls go through the ModelGateway, like chat turns.

pub mod extract;
pub mod handlers;
pub mod prompts;
pub mod recommender;
