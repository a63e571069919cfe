use serde_json::Value;

use docql_core::{DocqlError, DocqlResult};

use super::{invalid_value, CreateData, DbAction};

impl DbAction {
    /// Run the model's create preparation over one document or a batch.
    ///
    /// Batch entries are prepared independently; issues are tagged with the entry
    /// position and raised together once every entry has been checked.
    pub async fn set_create_data(&mut self, input: &Value) -> DocqlResult<()> {
        let schema = self.env.schema.clone();
        let data = match input {
            Value::Object(document) => {
                let mut ctx = self.prepare_context();
                let prepared = schema
                    .prepare_field_values(self.model, document, true, &mut ctx, None)
                    .await;
                if ctx.has_issues() {
                    return Err(DocqlError::validation(ctx.take_issues()));
                }
                CreateData::One(prepared)
            }
            Value::Array(entries) => {
                let mut prepared = Vec::with_capacity(entries.len());
                let mut issues = Vec::new();
                for (position, entry) in entries.iter().enumerate() {
                    let Value::Object(document) = entry else {
                        return Err(invalid_value(format!(
                            "Entry {} of the data to create is not a JSON object",
                            position
                        )));
                    };
                    let mut ctx = self.prepare_context();
                    let data = schema
                        .prepare_field_values(self.model, document, true, &mut ctx, None)
                        .await;
                    if ctx.has_issues() {
                        issues.extend(
                            ctx.take_issues()
                                .into_iter()
                                .map(|issue| issue.with_entry(position)),
                        );
                    } else {
                        prepared.push(data);
                    }
                }
                if !issues.is_empty() {
                    tracing::debug!(
                        "{} validation issue(s) in a batch of {} '{}' documents",
                        issues.len(),
                        entries.len(),
                        self.model().name()
                    );
                    return Err(DocqlError::validation(issues));
                }
                CreateData::Many(prepared)
            }
            _ => {
                return Err(invalid_value(
                    "The data to create needs to be a single JSON object or an array of JSON objects",
                ))
            }
        };
        self.definition.create_data = Some(data);
        Ok(())
    }
}
