//! Online Store theme operations.
//!
//! Results are returned as the GraphQL `data` object, unchanged apart from
//! a `decodedSize` annotation on base64 file bodies.

use api_tester_core::themes::{
    DELETE_THEME_FILE, DeleteFilesVariables, FileContentVariables, GET_FILE_CONTENT, GET_SHOP,
    GET_THEME_FILES, LIST_THEMES, ThemeFileInput, ThemeIdVariables, UPSERT_THEME_FILE,
    UpsertFilesVariables, theme_gid,
};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::{Map, Value};
use tracing::instrument;

use super::{AdminGraphqlClient, ShopifyError, StoreTarget};

impl AdminGraphqlClient {
    /// Shop name, email, domain and plan. Doubles as a connection test.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the request fails or GraphQL reports errors.
    pub async fn get_shop(&self, target: &StoreTarget) -> Result<Value, ShopifyError> {
        self.query(target, GET_SHOP, Map::new()).await
    }

    /// First 20 themes.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the request fails or GraphQL reports errors.
    pub async fn list_themes(&self, target: &StoreTarget) -> Result<Value, ShopifyError> {
        self.query(target, LIST_THEMES, Map::new()).await
    }

    /// File metadata (first 250) for one theme.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the request fails or GraphQL reports errors.
    #[instrument(skip(self, target))]
    pub async fn get_theme_files(
        &self,
        target: &StoreTarget,
        theme_id: &str,
    ) -> Result<Value, ShopifyError> {
        let variables = ThemeIdVariables {
            theme_id: theme_gid(theme_id),
        };
        self.query(target, GET_THEME_FILES, variables).await
    }

    /// Body of a single file.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError` if the request fails or GraphQL reports errors.
    #[instrument(skip(self, target))]
    pub async fn get_file_content(
        &self,
        target: &StoreTarget,
        theme_id: &str,
        filename: &str,
    ) -> Result<Value, ShopifyError> {
        let variables = FileContentVariables {
            theme_id: theme_gid(theme_id),
            filenames: vec![filename.to_string()],
        };
        let mut data = self.query(target, GET_FILE_CONTENT, variables).await?;
        annotate_base64_sizes(&mut data);
        Ok(data)
    }

    /// Create or overwrite a file with a text body.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the file, or any
    /// other `ShopifyError` if the request fails.
    #[instrument(skip(self, target, content), fields(content_len = content.len()))]
    pub async fn upsert_file(
        &self,
        target: &StoreTarget,
        theme_id: &str,
        filename: &str,
        content: &str,
    ) -> Result<Value, ShopifyError> {
        let variables = UpsertFilesVariables {
            theme_id: theme_gid(theme_id),
            files: vec![ThemeFileInput::text(filename, content)],
        };
        let data = self.query(target, UPSERT_THEME_FILE, variables).await?;
        check_user_errors(&data, "themeFilesUpsert")?;
        tracing::info!(filename, "Theme file upserted");
        Ok(data)
    }

    /// Delete a file by name.
    ///
    /// # Errors
    ///
    /// Returns `ShopifyError::UserErrors` if Shopify rejects the delete, or
    /// any other `ShopifyError` if the request fails.
    #[instrument(skip(self, target))]
    pub async fn delete_file(
        &self,
        target: &StoreTarget,
        theme_id: &str,
        filename: &str,
    ) -> Result<Value, ShopifyError> {
        let variables = DeleteFilesVariables {
            theme_id: theme_gid(theme_id),
            files: vec![filename.to_string()],
        };
        let data = self.query(target, DELETE_THEME_FILE, variables).await?;
        check_user_errors(&data, "themeFilesDelete")?;
        tracing::info!(filename, "Theme file deleted");
        Ok(data)
    }
}

/// Fail when `data.{field}.userErrors` is a non-empty array.
fn check_user_errors(data: &Value, field: &str) -> Result<(), ShopifyError> {
    match data.get(field).and_then(|payload| payload.get("userErrors")) {
        Some(Value::Array(errors)) if !errors.is_empty() => {
            Err(ShopifyError::UserErrors(Value::Array(errors.clone())))
        }
        _ => Ok(()),
    }
}

/// Add `decodedSize` next to every `contentBase64` body.
fn annotate_base64_sizes(data: &mut Value) {
    let Some(nodes) = data
        .pointer_mut("/theme/files/nodes")
        .and_then(Value::as_array_mut)
    else {
        return;
    };

    for node in nodes {
        let Some(body) = node.get_mut("body").and_then(Value::as_object_mut) else {
            continue;
        };
        let decoded = body
            .get("contentBase64")
            .and_then(Value::as_str)
            .and_then(|encoded| STANDARD.decode(encoded).ok());
        if let Some(bytes) = decoded {
            body.insert("decodedSize".to_string(), Value::from(bytes.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_check_user_errors_empty() {
        let data = json!({"themeFilesUpsert": {"upsertedThemeFiles": [], "userErrors": []}});
        assert!(check_user_errors(&data, "themeFilesUpsert").is_ok());
    }

    #[test]
    fn test_check_user_errors_present() {
        let data = json!({"themeFilesDelete": {
            "deletedThemeFiles": null,
            "userErrors": [{"field": ["files"], "message": "File not found"}]
        }});
        let err = check_user_errors(&data, "themeFilesDelete").unwrap_err();
        assert!(matches!(err, ShopifyError::UserErrors(_)));
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_annotate_base64_sizes() {
        let mut data = json!({"theme": {"files": {"nodes": [
            {"filename": "assets/logo.png", "body": {"contentBase64": "aGVsbG8="}},
            {"filename": "layout/theme.liquid", "body": {"content": "<html>"}}
        ]}}});
        annotate_base64_sizes(&mut data);
        assert_eq!(data["theme"]["files"]["nodes"][0]["body"]["decodedSize"], 5);
        assert!(data["theme"]["files"]["nodes"][1]["body"].get("decodedSize").is_none());
    }

    #[test]
    fn test_annotate_ignores_missing_theme() {
        let mut data = json!({"theme": null});
        annotate_base64_sizes(&mut data);
        assert_eq!(data, json!({"theme": null}));
    }
}
