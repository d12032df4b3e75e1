use serde::{Deserialize, Serialize};
use strum_macros::Display;

use super::{MemStore, Record, StoreResult};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminRole {
    #[default]
    Admin,
    SuperAdmin,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdminStatus {
    #[default]
    Active,
    Inactive,
    Suspended,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminPermission {
    ManageAdmins,
    ManageCategories,
    ManageProviders,
    ViewDashboard,
    EditSettings,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub status: AdminStatus,
    pub permissions: Vec<AdminPermission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Record for Admin {
    fn id(&self) -> i64 {
        self.id
    }
}

#[derive(Debug, Deserialize)]
pub struct NewAdmin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: AdminRole,
    pub status: AdminStatus,
    pub permissions: Vec<AdminPermission>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAdminData {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub status: Option<AdminStatus>,
    pub permissions: Option<Vec<AdminPermission>>,
}

#[derive(Default)]
pub struct AdminStore {
    inner: MemStore<Admin>,
}

impl AdminStore {
    pub fn new() -> Self {
        Self {
            inner: MemStore::new(),
        }
    }

    pub fn create(&self, data: NewAdmin) -> StoreResult<Admin> {
        self.inner.insert(Admin {
            id: data.id,
            name: data.name,
            email: data.email,
            role: data.role,
            status: data.status,
            permissions: data.permissions,
            last_login_at: None,
            created_at: data.created_at,
            updated_at: data.updated_at,
        })
    }

    pub fn update(&self, id: i64, data: &UpdateAdminData, now: i64) -> StoreResult<Admin> {
        self.inner.update_with(id, |admin| {
            if let Some(name) = &data.name {
                admin.name = name.clone();
            }
            if let Some(email) = &data.email {
                admin.email = email.clone();
            }
            if let Some(role) = data.role {
                admin.role = role;
            }
            if let Some(status) = data.status {
                admin.status = status;
            }
            if let Some(permissions) = &data.permissions {
                admin.permissions = permissions.clone();
            }
            admin.updated_at = now;
        })
    }

    pub fn delete(&self, id: i64) -> StoreResult<Admin> {
        self.inner.remove(id)
    }

    pub fn get_by_id(&self, id: i64) -> StoreResult<Admin> {
        self.inner.get_by_id(id)
    }

    pub fn list_all(&self) -> StoreResult<Vec<Admin>> {
        self.inner.list_all()
    }

    pub fn count_super_admins(&self) -> StoreResult<usize> {
        self.inner.count(|admin| admin.role == AdminRole::SuperAdmin)
    }
}
