//! Login, admin account and password endpoints.

use reqwest::Method;
use tracing::instrument;

use atelier_core::AdminId;

use super::{
    Ack, Admin, AdminFilter, AdminInput, AdminListData, AdminPage, ApiError, ApiSession,
    LoginRequest, LoginResponse, PasswordChange,
};

impl ApiSession {
    /// Exchange credentials for a session token.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        self.send_for(Method::PUT, &["login"], &LoginRequest { email, password })
            .await
    }

    /// List admin accounts matching `filter`.
    #[instrument(skip(self))]
    pub async fn admins(&self, filter: &AdminFilter) -> Result<AdminPage, ApiError> {
        let data: AdminListData = self.get_with(&["admins"], filter).await?;
        Ok(data.into())
    }

    #[instrument(skip(self), fields(admin_id = %id))]
    pub async fn admin(&self, id: &AdminId) -> Result<Admin, ApiError> {
        self.get(&["admins", id.as_str()]).await
    }

    #[instrument(skip(self, input), fields(email = %input.email, role = %input.role))]
    pub async fn create_admin(&self, input: &AdminInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["admins"], Some(input)).await
    }

    #[instrument(skip(self, input), fields(admin_id = %id, role = %input.role))]
    pub async fn update_admin(&self, id: &AdminId, input: &AdminInput) -> Result<Ack, ApiError> {
        self.send(Method::POST, &["admins", id.as_str()], Some(input))
            .await
    }

    #[instrument(skip(self), fields(admin_id = %id))]
    pub async fn delete_admin(&self, id: &AdminId) -> Result<Ack, ApiError> {
        self.send::<()>(Method::DELETE, &["admins", id.as_str()], None)
            .await
    }

    /// Change the signed-in operator's password.
    #[instrument(skip_all)]
    pub async fn change_password(&self, current: &str, new: &str) -> Result<Ack, ApiError> {
        self.send(
            Method::PUT,
            &["change-password"],
            Some(&PasswordChange {
                current_password: current,
                new_password: new,
            }),
        )
        .await
    }
}
