//! Intake form shown on the home route.
//!
//! Typing an email schedules a lookup after a quiet period; a hit fills the
//! remaining fields and locks them. Submitting stores the returned token.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::RegistroGateway;
use crate::error::{AppError, AppResult};
use crate::models::registro::{Registro, RegistroCreate};
use crate::session::AuthSession;

pub const EMAIL_DEBOUNCE: Duration = Duration::from_millis(400);
pub const SEXO_OPTIONS: [&str; 3] = ["masculino", "femenino", "otro"];

pub const EMAIL_EXISTS_NOTICE: &str = "El correo ya está registrado. Los datos han sido autocompletados.";
const SUBMIT_OK: &str = "Formulario enviado exitosamente!";
const SUBMIT_FAILED: &str = "Error al enviar el formulario";
const CONNECTION_ERROR: &str = "Error de conexión. Por favor, inténtalo de nuevo.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Email,
    Nombre,
    Edad,
    Sexo,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pub email: String,
    pub nombre: String,
    pub edad: String,
    pub sexo: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    pub email: Option<String>,
    pub nombre: Option<String>,
    pub edad: Option<String>,
    pub sexo: Option<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.nombre.is_none() && self.edad.is_none() && self.sexo.is_none()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Email => &self.email,
            Field::Nombre => &self.nombre,
            Field::Edad => &self.edad,
            Field::Sexo => &self.sexo,
        }
    }

    fn clear(&mut self, field: Field) {
        match field {
            Field::Email => self.email = None,
            Field::Nombre => self.nombre = None,
            Field::Edad => self.edad = None,
            Field::Sexo => self.sexo = None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    fn success(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, text: text.into() }
    }

    fn error(text: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, text: text.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Field validation failed; see [`RegistrationForm::errors`].
    Invalid,
    /// Accepted and a token was stored. The caller moves to the chat route.
    Authenticated,
    /// Accepted without a token.
    Submitted,
    Rejected(String),
    Failed(String),
}

#[derive(Debug)]
struct LookupOutcome {
    email: String,
    registro: Option<Registro>,
}

pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

pub fn validate(data: &FormData) -> FormErrors {
    let mut errors = FormErrors::default();

    let email = data.email.trim();
    if email.is_empty() {
        errors.email = Some("El correo electrónico es requerido".into());
    } else if !is_valid_email(&data.email) {
        errors.email = Some("El correo electrónico no es válido".into());
    }

    let nombre = data.nombre.trim();
    if nombre.is_empty() {
        errors.nombre = Some("El nombre es requerido".into());
    } else if nombre.chars().count() < 2 {
        errors.nombre = Some("El nombre debe tener al menos 2 caracteres".into());
    }

    if data.edad.trim().is_empty() {
        errors.edad = Some("La edad es requerida".into());
    } else if parse_edad(&data.edad).is_none() {
        errors.edad = Some("La edad debe ser un número válido entre 1 y 120".into());
    }

    if data.sexo.trim().is_empty() {
        errors.sexo = Some("El sexo es requerido".into());
    }

    errors
}

fn parse_edad(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok().filter(|e| (1..=120).contains(e))
}

pub struct RegistrationForm {
    gateway: Arc<dyn RegistroGateway>,
    session: AuthSession,
    data: FormData,
    errors: FormErrors,
    email_exists: bool,
    notice: Option<Notice>,
    submitting: bool,
    pending: Option<CancellationToken>,
    lookup_tx: mpsc::UnboundedSender<LookupOutcome>,
    lookup_rx: mpsc::UnboundedReceiver<LookupOutcome>,
}

impl RegistrationForm {
    pub fn new(gateway: Arc<dyn RegistroGateway>, session: AuthSession) -> Self {
        let (lookup_tx, lookup_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            session,
            data: FormData::default(),
            errors: FormErrors::default(),
            email_exists: false,
            notice: None,
            submitting: false,
            pending: None,
            lookup_tx,
            lookup_rx,
        }
    }

    pub fn data(&self) -> &FormData {
        &self.data
    }

    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    /// Set after a lookup hit; nombre, edad and sexo are read-only while true.
    pub fn email_exists(&self) -> bool {
        self.email_exists
    }

    pub fn is_read_only(&self, field: Field) -> bool {
        self.email_exists && field != Field::Email
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn lookup_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Applies one edit. Returns `false` when the field is locked.
    ///
    /// Must be called inside a tokio runtime: an email edit may schedule a lookup.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> bool {
        if self.is_read_only(field) {
            log::debug!("Ignoring edit to locked field {:?}", field);
            return false;
        }
        let value = value.into();
        self.errors.clear(field);
        self.notice = None;

        match field {
            Field::Email => {
                self.data.email = value;
                self.email_exists = false;
                self.data.nombre.clear();
                self.data.edad.clear();
                self.data.sexo.clear();
                self.schedule_lookup();
            }
            Field::Nombre => self.data.nombre = value,
            Field::Edad => self.data.edad = value,
            Field::Sexo => self.data.sexo = value,
        }
        true
    }

    fn cancel_lookup(&mut self) {
        if let Some(token) = self.pending.take() {
            token.cancel();
        }
    }

    fn schedule_lookup(&mut self) {
        self.cancel_lookup();
        let email = self.data.email.trim().to_string();
        if email.is_empty() || !is_valid_email(&email) {
            return;
        }

        let token = CancellationToken::new();
        let task_token = token.clone();
        let gateway = Arc::clone(&self.gateway);
        let tx = self.lookup_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = task_token.cancelled() => {}
                _ = tokio::time::sleep(EMAIL_DEBOUNCE) => {
                    let registro = match gateway.registro_by_email(&email).await {
                        Ok(r) => Some(r),
                        Err(e) => {
                            log::debug!("Registro lookup miss: {}", e);
                            None
                        }
                    };
                    if !task_token.is_cancelled() {
                        let _ = tx.send(LookupOutcome { email, registro });
                    }
                }
            }
        });
        self.pending = Some(token);
    }

    /// Waits for the scheduled lookup and applies it. `None` when nothing is
    /// scheduled, otherwise whether the email is already registered.
    pub async fn await_lookup(&mut self) -> Option<bool> {
        while self.pending.is_some() {
            let outcome = self.lookup_rx.recv().await?;
            if let Some(exists) = self.apply_lookup(outcome) {
                return Some(exists);
            }
        }
        None
    }

    /// Applies any lookups that have already finished, without waiting.
    pub fn poll_lookup(&mut self) -> Option<bool> {
        let mut applied = None;
        while let Ok(outcome) = self.lookup_rx.try_recv() {
            if let Some(exists) = self.apply_lookup(outcome) {
                applied = Some(exists);
            }
        }
        applied
    }

    fn apply_lookup(&mut self, outcome: LookupOutcome) -> Option<bool> {
        if self.pending.is_none() || outcome.email != self.data.email.trim() {
            log::debug!("Dropping stale registro lookup");
            return None;
        }
        self.pending = None;

        match outcome.registro {
            Some(registro) => {
                log::info!("Registro found, autofilling form");
                self.data = FormData {
                    email: registro.email,
                    nombre: registro.nombre,
                    edad: registro.edad.to_string(),
                    sexo: registro.sexo,
                };
                self.email_exists = true;
                self.notice = Some(Notice::success(EMAIL_EXISTS_NOTICE));
                Some(true)
            }
            None => {
                self.email_exists = false;
                Some(false)
            }
        }
    }

    pub async fn submit(&mut self) -> AppResult<SubmitOutcome> {
        if self.submitting {
            return Err(AppError::Busy);
        }
        self.errors = validate(&self.data);
        if !self.errors.is_empty() {
            log::debug!("Registro form has validation errors");
            return Ok(SubmitOutcome::Invalid);
        }
        let edad = parse_edad(&self.data.edad)
            .ok_or_else(|| AppError::Validation("edad out of range".into()))?;

        let registro = RegistroCreate {
            email: self.data.email.trim().to_string(),
            nombre: self.data.nombre.trim().to_string(),
            edad,
            sexo: self.data.sexo.trim().to_string(),
            fecha_registro: chrono::Utc::now(),
        };

        self.submitting = true;
        self.notice = None;
        let gateway = Arc::clone(&self.gateway);
        let result = gateway.submit_registro(&registro).await;
        self.submitting = false;

        let response = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Registro submit failed: {}", e);
                self.notice = Some(Notice::error(CONNECTION_ERROR));
                return Ok(SubmitOutcome::Failed(e.to_string()));
            }
        };

        if !response.success {
            let text = response.error.unwrap_or_else(|| SUBMIT_FAILED.to_string());
            self.notice = Some(Notice::error(text.clone()));
            return Ok(SubmitOutcome::Rejected(text));
        }

        self.notice = Some(Notice::success(
            response.message.unwrap_or_else(|| SUBMIT_OK.to_string()),
        ));
        self.email_exists = false;
        match response.token.filter(|t| !t.is_empty()) {
            Some(token) => {
                self.session.store_token(&token)?;
                Ok(SubmitOutcome::Authenticated)
            }
            None => Ok(SubmitOutcome::Submitted),
        }
    }
}

impl Drop for RegistrationForm {
    fn drop(&mut self) {
        self.cancel_lookup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::registro::RegistroResponse;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubRegistro {
        known: Vec<Registro>,
        lookups: Mutex<Vec<String>>,
        response: Mutex<Option<AppResult<RegistroResponse>>>,
        submitted: Mutex<Vec<RegistroCreate>>,
    }

    #[async_trait]
    impl RegistroGateway for StubRegistro {
        async fn submit_registro(&self, registro: &RegistroCreate) -> AppResult<RegistroResponse> {
            self.submitted.lock().unwrap().push(registro.clone());
            self.response
                .lock()
                .unwrap()
                .take()
                .unwrap_or_else(|| Err(AppError::Network("offline".into())))
        }

        async fn registro_by_email(&self, email: &str) -> AppResult<Registro> {
            self.lookups.lock().unwrap().push(email.to_string());
            self.known
                .iter()
                .find(|r| r.email == email)
                .cloned()
                .ok_or_else(|| AppError::Http {
                    status: 404,
                    message: "Registro no encontrado".into(),
                    body: None,
                })
        }
    }

    fn ana() -> Registro {
        Registro {
            id: 1,
            email: "ana@correo.com".into(),
            nombre: "Ana".into(),
            edad: 29,
            sexo: "femenino".into(),
            fecha_registro: None,
        }
    }

    fn form(stub: Arc<StubRegistro>) -> (RegistrationForm, AuthSession) {
        let session = AuthSession::new(db::memory().unwrap());
        (RegistrationForm::new(stub, session.clone()), session)
    }

    fn fill(form: &mut RegistrationForm) {
        form.set_field(Field::Email, "luis@correo.com");
        form.set_field(Field::Nombre, "Luis");
        form.set_field(Field::Edad, "34");
        form.set_field(Field::Sexo, "masculino");
    }

    #[test]
    fn test_email_shape() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("ana.maria@correo.com.mx"));
        assert!(!is_valid_email("ana@correo"));
        assert!(!is_valid_email("ana@.com"));
        assert!(!is_valid_email("ana@correo."));
        assert!(!is_valid_email("@correo.com"));
        assert!(!is_valid_email("ana maria@correo.com"));
        assert!(!is_valid_email("ana@@correo.com"));
    }

    #[test]
    fn test_validation_messages() {
        let errors = validate(&FormData {
            email: "nope".into(),
            nombre: "A".into(),
            edad: "121".into(),
            sexo: String::new(),
        });
        assert_eq!(errors.get(Field::Email), Some("El correo electrónico no es válido"));
        assert_eq!(errors.get(Field::Nombre), Some("El nombre debe tener al menos 2 caracteres"));
        assert_eq!(errors.get(Field::Edad), Some("La edad debe ser un número válido entre 1 y 120"));
        assert_eq!(errors.get(Field::Sexo), Some("El sexo es requerido"));

        let errors = validate(&FormData::default());
        assert_eq!(errors.get(Field::Email), Some("El correo electrónico es requerido"));
        assert_eq!(errors.get(Field::Edad), Some("La edad es requerida"));

        let ok = validate(&FormData {
            email: "ana@correo.com".into(),
            nombre: "Ana".into(),
            edad: "1".into(),
            sexo: "otro".into(),
        });
        assert!(ok.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_hit_fills_and_locks_fields() {
        let stub = Arc::new(StubRegistro { known: vec![ana()], ..Default::default() });
        let (mut form, _) = form(stub);

        form.set_field(Field::Email, "ana@correo.com");
        assert!(form.lookup_pending());
        assert_eq!(form.await_lookup().await, Some(true));

        assert!(form.email_exists());
        assert_eq!(form.data().nombre, "Ana");
        assert_eq!(form.data().edad, "29");
        assert_eq!(form.data().sexo, "femenino");
        assert_eq!(form.notice().unwrap().text, EMAIL_EXISTS_NOTICE);
        assert!(form.is_read_only(Field::Nombre));
        assert!(!form.set_field(Field::Nombre, "Otra"));
        assert_eq!(form.data().nombre, "Ana");
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_miss_leaves_fields_editable_and_empty() {
        let stub = Arc::new(StubRegistro { known: vec![ana()], ..Default::default() });
        let (mut form, _) = form(stub);

        form.set_field(Field::Email, "nuevo@correo.com");
        assert_eq!(form.await_lookup().await, Some(false));
        assert!(!form.email_exists());
        assert!(form.data().nombre.is_empty());
        assert!(form.notice().is_none());
        assert!(form.set_field(Field::Nombre, "Nuevo"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_window_trigger_one_lookup() {
        let stub = Arc::new(StubRegistro { known: vec![ana()], ..Default::default() });
        let (mut form, _) = form(stub.clone());

        form.set_field(Field::Email, "ana@correo.co");
        tokio::time::advance(Duration::from_millis(200)).await;
        form.set_field(Field::Email, "ana@correo.com");
        assert_eq!(form.await_lookup().await, Some(true));

        assert_eq!(*stub.lookups.lock().unwrap(), vec!["ana@correo.com".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_email_schedules_nothing() {
        let stub = Arc::new(StubRegistro::default());
        let (mut form, _) = form(stub.clone());

        form.set_field(Field::Email, "ana@");
        assert!(!form.lookup_pending());
        assert_eq!(form.await_lookup().await, None);

        form.set_field(Field::Email, "ana@correo.com");
        form.set_field(Field::Email, "");
        assert!(!form.lookup_pending());
        tokio::time::sleep(EMAIL_DEBOUNCE * 2).await;
        assert!(stub.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_editing_email_unlocks_and_clears() {
        let stub = Arc::new(StubRegistro { known: vec![ana()], ..Default::default() });
        let (mut form, _) = form(stub);

        form.set_field(Field::Email, "ana@correo.com");
        form.await_lookup().await;
        assert!(form.email_exists());

        form.set_field(Field::Email, "ana@correo.co");
        assert!(!form.email_exists());
        assert!(form.data().nombre.is_empty());
        assert!(form.data().sexo.is_empty());
        assert!(form.notice().is_none());
    }

    #[tokio::test]
    async fn test_submit_with_token_authenticates() {
        let stub = Arc::new(StubRegistro::default());
        *stub.response.lock().unwrap() = Some(Ok(RegistroResponse {
            success: true,
            message: Some("Registro creado".into()),
            error: None,
            token: Some("tok-123".into()),
        }));
        let (mut form, session) = form(stub.clone());
        fill(&mut form);

        assert_eq!(form.submit().await.unwrap(), SubmitOutcome::Authenticated);
        assert_eq!(session.token().unwrap().as_deref(), Some("tok-123"));
        assert_eq!(form.notice().unwrap().kind, NoticeKind::Success);

        let sent = stub.submitted.lock().unwrap();
        assert_eq!(sent[0].edad, 34);
        assert_eq!(sent[0].email, "luis@correo.com");
    }

    #[tokio::test]
    async fn test_submit_invalid_sends_nothing() {
        let stub = Arc::new(StubRegistro::default());
        let (mut form, _) = form(stub.clone());
        form.set_field(Field::Nombre, "L");

        assert_eq!(form.submit().await.unwrap(), SubmitOutcome::Invalid);
        assert!(form.errors().get(Field::Email).is_some());
        assert!(stub.submitted.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_submit_failures_surface_as_notice() {
        let stub = Arc::new(StubRegistro::default());
        *stub.response.lock().unwrap() = Some(Ok(RegistroResponse {
            success: false,
            error: Some("Correo duplicado".into()),
            ..Default::default()
        }));
        let (mut form, session) = form(stub);
        fill(&mut form);

        assert_eq!(
            form.submit().await.unwrap(),
            SubmitOutcome::Rejected("Correo duplicado".into())
        );
        assert_eq!(form.notice().unwrap().kind, NoticeKind::Error);

        // Stub has no queued response now, so the next submit is a network error.
        assert!(matches!(form.submit().await.unwrap(), SubmitOutcome::Failed(_)));
        assert_eq!(form.notice().unwrap().text, CONNECTION_ERROR);
        assert!(!form.is_submitting());
        assert!(!session.is_authenticated());
    }
}
