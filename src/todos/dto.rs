use serde::Deserialize;

/// Body of `POST /todos` and `PUT /todos/:id`.
///
/// Unknown fields such as `user_id` are ignored, so a payload cannot pick the owner.
#[derive(Debug, Clone, Deserialize)]
pub struct TodoRequest {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_defaults_to_false() {
        let req: TodoRequest = serde_json::from_str(r#"{"title":"buy milk"}"#).unwrap();
        assert_eq!(req.title, "buy milk");
        assert!(!req.completed);
    }

    #[test]
    fn title_is_required() {
        assert!(serde_json::from_str::<TodoRequest>(r#"{"completed":true}"#).is_err());
    }
}
