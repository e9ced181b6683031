//! Department resource endpoints

use serde::{Deserialize, Serialize};

use crate::auth::ApiMessage;
use crate::client::ApiClient;
use crate::Result;

const RESOURCE: &str = "/department";

#[derive(Debug, Clone, Serialize)]
pub struct DepartmentPayload {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: String,
    pub name: String,
    pub description: String,
    pub created_by: String,
    pub members: u32,
}

impl ApiClient {
    pub async fn create_department(&self, payload: &DepartmentPayload) -> Result<Department> {
        self.post(RESOURCE, payload).await
    }

    pub async fn get_departments(&self) -> Result<Vec<Department>> {
        self.get(RESOURCE).await
    }

    pub async fn update_department(
        &self,
        id: &str,
        payload: &DepartmentPayload,
    ) -> Result<Department> {
        self.put(&format!("{RESOURCE}/{id}"), payload).await
    }

    pub async fn delete_department(&self, id: &str) -> Result<ApiMessage> {
        self.delete(&format!("{RESOURCE}/{id}")).await
    }
}
