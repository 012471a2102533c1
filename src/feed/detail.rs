use serde_json::Value;

/// Extract the due date from a Redmine issue detail payload.
///
/// `issue.due_date` wins when set; otherwise the custom field named
/// `due_date_field` is consulted. Returns an empty string when neither
/// carries a value (an empty field name skips the custom-field scan).
pub fn due_date_from_json(payload: &str, due_date_field: &str) -> Result<String, serde_json::Error> {
    let value: Value = serde_json::from_str(payload)?;
    let issue = &value["issue"];

    if let Some(due) = issue["due_date"].as_str()
        && !due.is_empty()
    {
        return Ok(due.to_string());
    }

    if due_date_field.is_empty() {
        return Ok(String::new());
    }

    if let Some(fields) = issue["custom_fields"].as_array() {
        for field in fields {
            if field["name"].as_str() == Some(due_date_field) {
                return Ok(field["value"].as_str().unwrap_or("").to_string());
            }
        }
    }

    Ok(String::new())
}
