use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Profile {
    pub id: i64,
    pub name: String,
    pub terminology_text: String,
    pub style_text: String,
    pub custom_system_prompt: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub terminology_text: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub style_text: String,
    #[serde(default)]
    #[validate(length(max = 20000))]
    pub custom_system_prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, Validate)]
#[serde(deny_unknown_fields)]
pub struct ProfileUpdate {
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    #[validate(length(max = 20000))]
    pub terminology_text: Option<String>,
    #[validate(length(max = 20000))]
    pub style_text: Option<String>,
    #[validate(length(max = 20000))]
    pub custom_system_prompt: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.terminology_text.is_none()
            && self.style_text.is_none()
            && self.custom_system_prompt.is_none()
    }
}
