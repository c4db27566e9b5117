mod schema;

pub use schema::{
    API_KEY_ENV, API_KEY_PLACEHOLDER, Config, ConversationSection, IndexingSection,
    ProviderConfig,
};
