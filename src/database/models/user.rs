use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{trimmed, FieldErrors};
use crate::error::ApiError;
use crate::filter::{FieldKind, FieldPolicy, FieldRule, EXACT};
use crate::types::Role;

pub const POLICY: FieldPolicy = FieldPolicy::new(&[
    FieldRule::new("name", FieldKind::Text, EXACT),
    FieldRule::new("email", FieldKind::Text, EXACT),
    FieldRule::new("role", FieldKind::Text, EXACT),
]);

pub const MIN_PASSWORD_LEN: usize = 6;

fn check_password(errors: &mut FieldErrors, field: &str, password: Option<&str>) {
    match password {
        None => errors.add(field, "Please add a password"),
        Some(p) if p.chars().count() < MIN_PASSWORD_LEN => {
            errors.add(field, format!("Password must be at least {} characters", MIN_PASSWORD_LEN))
        }
        Some(_) => {}
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

impl RegisterInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("name", self.name.as_deref(), true, 50);
        errors.text("email", self.email.as_deref(), true, 254);
        errors.email("email", self.email.as_deref());
        check_password(&mut errors, "password", self.password.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForgotPasswordInput {
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResetPasswordInput {
    pub password: Option<String>,
}

impl ResetPasswordInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        check_password(&mut errors, "password", self.password.as_deref());
        errors.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdatePasswordInput {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl UpdatePasswordInput {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.check(self.current_password.is_some(), "current_password", "Please add your current password");
        check_password(&mut errors, "new_password", self.new_password.as_deref());
        errors.finish()
    }
}

/// Profile changes by the user themselves, or by an admin (who may also set the role)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = FieldErrors::new();
        errors.text("name", self.name.as_deref(), false, 50);
        errors.email("email", self.email.as_deref());
        errors.finish()
    }

    pub fn into_fields(self) -> Map<String, Value> {
        let email = self.email.as_deref().map(normalize_email);
        let mut fields = trimmed(super::to_fields(&self));
        if let Some(email) = email {
            fields.insert("email".into(), Value::String(email));
        }
        fields
    }
}

/// Account creation from the admin API and the CLI
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
}

impl NewUser {
    pub fn validate(&self) -> Result<(), ApiError> {
        RegisterInput {
            name: self.name.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
        .validate()
    }
}

impl From<RegisterInput> for NewUser {
    fn from(input: RegisterInput) -> Self {
        Self {
            name: input.name,
            email: input.email,
            password: input.password,
            role: None,
        }
    }
}
