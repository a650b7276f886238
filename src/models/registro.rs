use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Intake record as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registro {
    pub id: i64,
    pub email: String,
    pub nombre: String,
    pub edad: i32,
    pub sexo: String,
    #[serde(default)]
    pub fecha_registro: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegistroCreate {
    pub email: String,
    pub nombre: String,
    pub edad: i32,
    pub sexo: String,
    #[serde(rename = "fechaRegistro")]
    pub fecha_registro: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistroResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}
