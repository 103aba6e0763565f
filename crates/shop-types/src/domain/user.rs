use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::validation::{self, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub age: u32,
    pub is_married: bool,
    // Stored, never rendered back to callers.
    #[serde(skip_serializing, default)]
    pub password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{first_name} {last_name}")
}

impl User {
    pub fn new(
        id: String,
        first_name: String,
        last_name: String,
        age: u32,
        is_married: bool,
        password: String,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validate_profile(&first_name, &last_name, age, &password)?;
        Ok(Self {
            full_name: full_name(&first_name, &last_name),
            id,
            first_name,
            last_name,
            age,
            is_married,
            password,
            created_at,
            updated_at: None,
        })
    }

    pub fn apply(&mut self, update: &UserUpdate) {
        self.first_name = update.first_name.clone();
        self.last_name = update.last_name.clone();
        self.full_name = full_name(&self.first_name, &self.last_name);
        self.age = update.age;
        self.is_married = update.is_married;
        self.password = update.password.clone();
        self.updated_at = Some(update.updated_at);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserUpdate {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    pub is_married: bool,
    pub password: String,
    pub updated_at: DateTime<Utc>,
}

impl UserUpdate {
    pub fn new(
        id: String,
        first_name: String,
        last_name: String,
        age: u32,
        is_married: bool,
        password: String,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validation::require("id", &id)?;
        validate_profile(&first_name, &last_name, age, &password)?;
        Ok(Self {
            id,
            first_name,
            last_name,
            age,
            is_married,
            password,
            updated_at,
        })
    }

    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    #[serde(default)]
    pub is_married: bool,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateUserRequest {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub age: u32,
    #[serde(default)]
    pub is_married: bool,
    pub password: String,
}

fn validate_profile(
    first_name: &str,
    last_name: &str,
    age: u32,
    password: &str,
) -> Result<(), ValidationError> {
    validation::require("first_name", first_name)?;
    validation::require("last_name", last_name)?;
    validation::validate_age(age)?;
    validation::validate_password(password)
}
