//! Firestore REST implementation of [`DocumentStore`].
//!
//! Firestore stores typed values (`{"stringValue": "..."}`); documents are
//! converted to and from plain JSON at this boundary so the rest of the crate
//! only sees `serde_json` objects.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Number, Value, json};
use tracing::instrument;

use super::FirebaseClient;
use crate::db::{
    Collection, Document, DocumentStore, Fields, Revision, StoreError, document_path,
};

/// Page size used when listing a collection.
const LIST_PAGE_SIZE: &str = "300";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
    update_time: String,
}

impl FirestoreDocument {
    fn into_document(self) -> Document {
        let id = self
            .name
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string();
        Document {
            id,
            fields: self
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), decode_value(v)))
                .collect(),
            revision: Revision::new(self.update_time),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<FirestoreDocument>,
    next_page_token: Option<String>,
}

/// Document store backed by Cloud Firestore.
#[derive(Clone)]
pub struct FirestoreStore {
    client: FirebaseClient,
}

impl FirestoreStore {
    /// Create a store using the shared Firebase client.
    #[must_use]
    pub const fn new(client: FirebaseClient) -> Self {
        Self { client }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.client.firestore_base(), collection)
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!(
            "{}/{}/{}",
            self.client.firestore_base(),
            collection,
            urlencoding::encode(id)
        )
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    #[instrument(skip(self), fields(collection = %collection))]
    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let request = self
            .client
            .authorize(self.client.http().get(self.document_url(collection, id)));

        match self
            .client
            .execute_json::<FirestoreDocument>(request)
            .await
        {
            Ok(doc) => Ok(Some(doc.into_document())),
            Err(e) if e.status() == Some(404) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn list(&self, collection: Collection) -> Result<Vec<Document>, StoreError> {
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("pageSize", LIST_PAGE_SIZE.to_string())];
            if let Some(token) = page_token.take() {
                query.push(("pageToken", token));
            }
            let request = self.client.authorize(
                self.client
                    .http()
                    .get(self.collection_url(collection))
                    .query(&query),
            );
            let page: ListResponse = self.client.execute_json(request).await?;

            documents.extend(page.documents.into_iter().map(FirestoreDocument::into_document));

            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(count = documents.len(), "Listed documents");
        Ok(documents)
    }

    #[instrument(skip(self, fields), fields(collection = %collection))]
    async fn create(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
    ) -> Result<Document, StoreError> {
        let request = self.client.authorize(
            self.client
                .http()
                .post(self.collection_url(collection))
                .query(&[("documentId", id)])
                .json(&json!({ "fields": encode_fields(&fields) })),
        );

        match self
            .client
            .execute_json::<FirestoreDocument>(request)
            .await
        {
            Ok(doc) => Ok(doc.into_document()),
            Err(e) if e.status() == Some(409) => {
                Err(StoreError::AlreadyExists(document_path(collection, id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, fields, precondition), fields(collection = %collection))]
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        fields: Fields,
        precondition: Option<&Revision>,
    ) -> Result<Document, StoreError> {
        let mut query: Vec<(&str, String)> = fields
            .keys()
            .map(|key| ("updateMask.fieldPaths", field_path(key)))
            .collect();
        match precondition {
            Some(revision) => {
                query.push(("currentDocument.updateTime", revision.as_str().to_string()));
            }
            None => query.push(("currentDocument.exists", "true".to_string())),
        }

        let request = self.client.authorize(
            self.client
                .http()
                .patch(self.document_url(collection, id))
                .query(&query)
                .json(&json!({ "fields": encode_fields(&fields) })),
        );

        match self
            .client
            .execute_json::<FirestoreDocument>(request)
            .await
        {
            Ok(doc) => Ok(doc.into_document()),
            Err(e) if e.status() == Some(404) => {
                Err(StoreError::NotFound(document_path(collection, id)))
            }
            Err(e) if e.status() == Some(409) || e.has_code("FAILED_PRECONDITION") => {
                Err(StoreError::Conflict(document_path(collection, id)))
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(collection = %collection))]
    async fn delete(&self, collection: Collection, id: &str) -> Result<(), StoreError> {
        let request = self
            .client
            .authorize(self.client.http().delete(self.document_url(collection, id)));

        match self.client.execute(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.status() == Some(404) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let request = self.client.authorize(
            self.client
                .http()
                .get(self.collection_url(Collection::Items))
                .query(&[("pageSize", "1")]),
        );
        self.client
            .execute(request)
            .await
            .map(|_| ())
            .map_err(StoreError::from)
    }
}

/// Quote a field name for an update mask unless it is a simple identifier.
fn field_path(key: &str) -> String {
    let simple = key
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if simple {
        key.to_string()
    } else {
        format!("`{}`", key.replace('\\', "\\\\").replace('`', "\\`"))
    }
}

fn encode_fields(fields: &Fields) -> Map<String, Value> {
    fields
        .iter()
        .map(|(k, v)| (k.clone(), encode_value(v)))
        .collect()
}

/// Convert plain JSON into a Firestore typed value.
fn encode_value(value: &Value) -> Value {
    match value {
        Value::Null => json!({ "nullValue": null }),
        Value::Bool(b) => json!({ "booleanValue": b }),
        Value::Number(n) => n.as_i64().map_or_else(
            || json!({ "doubleValue": n.as_f64().unwrap_or_default() }),
            |i| json!({ "integerValue": i.to_string() }),
        ),
        Value::String(s) => json!({ "stringValue": s }),
        Value::Array(values) => {
            json!({ "arrayValue": { "values": values.iter().map(encode_value).collect::<Vec<_>>() } })
        }
        Value::Object(map) => json!({ "mapValue": { "fields": encode_fields(map) } }),
    }
}

/// Convert a Firestore typed value into plain JSON.
///
/// Timestamps, references and bytes become strings; unknown value kinds become
/// `null`.
fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|m| m.iter().next()) else {
        return Value::Null;
    };

    match kind.as_str() {
        "booleanValue" => inner.as_bool().map_or(Value::Null, Value::Bool),
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .or_else(|| inner.as_i64())
            .map_or(Value::Null, |i| Value::Number(i.into())),
        "doubleValue" => inner
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        "stringValue" | "timestampValue" | "referenceValue" | "bytesValue" => inner.clone(),
        "geoPointValue" => inner.clone(),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "mapValue" => Value::Object(
            inner
                .get("fields")
                .and_then(Value::as_object)
                .map(|fields| {
                    fields
                        .iter()
                        .map(|(k, v)| (k.clone(), decode_value(v)))
                        .collect()
                })
                .unwrap_or_default(),
        ),
        _ => Value::Null,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_cart_document() {
        let encoded = encode_value(&json!({
            "cart": [{"itemId": "sku1", "quantity": 2}],
            "price": 799.5,
        }));

        assert_eq!(
            encoded["mapValue"]["fields"]["cart"]["arrayValue"]["values"][0]["mapValue"]["fields"]
                ["quantity"],
            json!({"integerValue": "2"})
        );
        assert_eq!(
            encoded["mapValue"]["fields"]["price"],
            json!({"doubleValue": 799.5})
        );
    }

    #[test]
    fn test_decode_typed_values() {
        let doc = FirestoreDocument {
            name: "projects/p/databases/(default)/documents/users/uid-7".to_string(),
            fields: json!({
                "name": {"stringValue": "Asha"},
                "createdAt": {"timestampValue": "2024-11-02T10:15:00.123456Z"},
                "cart": {"arrayValue": {"values": [
                    {"mapValue": {"fields": {
                        "itemId": {"stringValue": "sku1"},
                        "quantity": {"integerValue": "3"}
                    }}}
                ]}},
                "tags": {"arrayValue": {}},
                "rating": {"doubleValue": 4.5},
                "verified": {"booleanValue": true},
                "nickname": {"nullValue": null}
            })
            .as_object()
            .cloned()
            .unwrap(),
            update_time: "2024-11-02T10:15:01.000001Z".to_string(),
        }
        .into_document();

        assert_eq!(doc.id, "uid-7");
        assert_eq!(doc.revision.as_str(), "2024-11-02T10:15:01.000001Z");
        assert_eq!(
            Value::Object(doc.fields),
            json!({
                "name": "Asha",
                "createdAt": "2024-11-02T10:15:00.123456Z",
                "cart": [{"itemId": "sku1", "quantity": 3}],
                "tags": [],
                "rating": 4.5,
                "verified": true,
                "nickname": null
            })
        );
    }

    #[test]
    fn test_field_path_quoting() {
        assert_eq!(field_path("cart"), "cart");
        assert_eq!(field_path("rating_count"), "rating_count");
        assert_eq!(field_path("my-field"), "`my-field`");
        assert_eq!(field_path("1st"), "`1st`");
    }
}
