/*
[INPUT]:  Collection names, document ids, payloads and list queries
[OUTPUT]: Documents created, fetched, updated, listed or deleted
[POS]:    HTTP layer - document CRUD endpoints
[UPDATE]: When adding document endpoints or changing their paths
*/

// ### Document Endpoints

use reqwest::Method;
use serde::Serialize;

use crate::http::{CocobaseClient, Result};
use crate::query::QueryBuilder;
use crate::types::Document;

impl CocobaseClient {
    /// Fetch one document
    ///
    /// GET /collections/{collection}/documents/{id}
    pub async fn get_document(&self, collection: &str, id: &str) -> Result<Document> {
        let url = self.endpoint(&["collections", collection, "documents", id])?;
        self.send_json(Method::GET, url, None, true).await
    }

    /// Create a document; `data` is sent as `{"data": data}`
    ///
    /// POST /collections/documents?collection={collection}
    pub async fn create_document<T>(&self, collection: &str, data: &T) -> Result<Document>
    where
        T: Serialize + ?Sized,
    {
        let mut url = self.endpoint(&["collections", "documents"])?;
        url.query_pairs_mut().append_pair("collection", collection);
        let body = serde_json::to_value(data)?;
        self.send_json(Method::POST, url, Some(body), true).await
    }

    /// Patch a document with the given fields
    ///
    /// PATCH /collections/{collection}/documents/{id}
    pub async fn update_document<T>(&self, collection: &str, id: &str, data: &T) -> Result<Document>
    where
        T: Serialize + ?Sized,
    {
        let url = self.endpoint(&["collections", collection, "documents", id])?;
        let body = serde_json::to_value(data)?;
        self.send_json(Method::PATCH, url, Some(body), true).await
    }

    /// Delete a document
    ///
    /// DELETE /collections/{collection}/documents/{id}
    pub async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let url = self.endpoint(&["collections", collection, "documents", id])?;
        self.request(Method::DELETE, url, None, true).await?;
        Ok(())
    }

    /// List documents, optionally filtered
    ///
    /// GET /collections/{collection}/documents?{query}
    pub async fn list_documents(
        &self,
        collection: &str,
        query: Option<&QueryBuilder>,
    ) -> Result<Vec<Document>> {
        let query = query.map(QueryBuilder::build).unwrap_or_default();
        self.query_documents(collection, &query).await
    }

    /// List documents with a hand-written query string
    ///
    /// GET /collections/{collection}/documents?{raw_query}
    pub async fn query_documents(&self, collection: &str, raw_query: &str) -> Result<Vec<Document>> {
        let mut url = self.endpoint(&["collections", collection, "documents"])?;
        let raw_query = raw_query.trim_start_matches('?');
        if !raw_query.is_empty() {
            url.set_query(Some(raw_query));
        }
        self.send_json(Method::GET, url, None, true).await
    }
}
