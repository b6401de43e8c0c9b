//! The two content-facing API objects. Both are thin wrappers over one
//! [`RteSession`]; every method returns the protocol's string results.

use crate::errors::ApiCallError;
use crate::session::RteSession;
use crate::version::ScormVersion;

const TRUE: &str = "true";
const FALSE: &str = "false";

fn bool_result(value: bool) -> String {
    let result = if value { TRUE } else { FALSE };
    result.to_string()
}

/// SCORM 1.2 `API`.
#[derive(Clone)]
pub struct Scorm12Api {
    session: RteSession,
}

impl Scorm12Api {
    pub(crate) fn new(session: RteSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &RteSession {
        &self.session
    }

    pub fn lms_initialize(&self, parameter: &str) -> String {
        bool_result(self.session.initialize(parameter))
    }

    pub fn lms_finish(&self, parameter: &str) -> String {
        bool_result(self.session.terminate(parameter))
    }

    pub fn lms_get_value(&self, element: &str) -> String {
        self.session.get_value(element)
    }

    pub fn lms_set_value(&self, element: &str, value: &str) -> String {
        bool_result(self.session.set_value(element, value))
    }

    pub fn lms_commit(&self, parameter: &str) -> String {
        bool_result(self.session.commit(parameter))
    }

    pub fn lms_get_last_error(&self) -> String {
        self.session.last_error()
    }

    pub fn lms_get_error_string(&self, code: &str) -> String {
        self.session.error_string(code)
    }

    pub fn lms_get_diagnostic(&self, code: &str) -> String {
        self.session.diagnostic(code)
    }
}

/// SCORM 2004 `API_1484_11`.
#[derive(Clone)]
pub struct Scorm2004Api {
    session: RteSession,
}

impl Scorm2004Api {
    pub(crate) fn new(session: RteSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &RteSession {
        &self.session
    }

    pub fn initialize(&self, parameter: &str) -> String {
        bool_result(self.session.initialize(parameter))
    }

    pub fn terminate(&self, parameter: &str) -> String {
        bool_result(self.session.terminate(parameter))
    }

    pub fn get_value(&self, element: &str) -> String {
        self.session.get_value(element)
    }

    pub fn set_value(&self, element: &str, value: &str) -> String {
        bool_result(self.session.set_value(element, value))
    }

    pub fn commit(&self, parameter: &str) -> String {
        bool_result(self.session.commit(parameter))
    }

    pub fn get_last_error(&self) -> String {
        self.session.last_error()
    }

    pub fn get_error_string(&self, code: &str) -> String {
        self.session.error_string(code)
    }

    pub fn get_diagnostic(&self, code: &str) -> String {
        self.session.diagnostic(code)
    }
}

/// Whichever API object a session exposes, addressable by method name.
#[derive(Clone)]
pub enum ApiObject {
    Scorm12(Scorm12Api),
    Scorm2004(Scorm2004Api),
}

pub const SCORM12_METHODS: &[(&str, usize)] = &[
    ("LMSInitialize", 1),
    ("LMSFinish", 1),
    ("LMSGetValue", 1),
    ("LMSSetValue", 2),
    ("LMSCommit", 1),
    ("LMSGetLastError", 0),
    ("LMSGetErrorString", 1),
    ("LMSGetDiagnostic", 1),
];

pub const SCORM2004_METHODS: &[(&str, usize)] = &[
    ("Initialize", 1),
    ("Terminate", 1),
    ("GetValue", 1),
    ("SetValue", 2),
    ("Commit", 1),
    ("GetLastError", 0),
    ("GetErrorString", 1),
    ("GetDiagnostic", 1),
];

impl ApiObject {
    pub fn for_session(session: RteSession) -> Self {
        match session.version() {
            ScormVersion::Scorm12 => Self::Scorm12(Scorm12Api::new(session)),
            ScormVersion::Scorm2004 => Self::Scorm2004(Scorm2004Api::new(session)),
        }
    }

    pub fn version(&self) -> ScormVersion {
        match self {
            Self::Scorm12(_) => ScormVersion::Scorm12,
            Self::Scorm2004(_) => ScormVersion::Scorm2004,
        }
    }

    pub fn session(&self) -> &RteSession {
        match self {
            Self::Scorm12(api) => api.session(),
            Self::Scorm2004(api) => api.session(),
        }
    }

    pub fn methods(&self) -> &'static [(&'static str, usize)] {
        match self {
            Self::Scorm12(_) => SCORM12_METHODS,
            Self::Scorm2004(_) => SCORM2004_METHODS,
        }
    }

    /// Dispatches `method` by its protocol name. The argument count must
    /// match exactly.
    pub fn call(&self, method: &str, args: &[String]) -> Result<String, ApiCallError> {
        let Some((_, expected)) = self.methods().iter().find(|(name, _)| *name == method) else {
            return Err(ApiCallError::UnknownMethod(method.to_string()));
        };
        if args.len() != *expected {
            return Err(ApiCallError::Arity {
                method: method.to_string(),
                expected: *expected,
                got: args.len(),
            });
        }
        let arg = |index: usize| args.get(index).map(String::as_str).unwrap_or_default();

        let result = match self {
            Self::Scorm12(api) => match method {
                "LMSInitialize" => api.lms_initialize(arg(0)),
                "LMSFinish" => api.lms_finish(arg(0)),
                "LMSGetValue" => api.lms_get_value(arg(0)),
                "LMSSetValue" => api.lms_set_value(arg(0), arg(1)),
                "LMSCommit" => api.lms_commit(arg(0)),
                "LMSGetLastError" => api.lms_get_last_error(),
                "LMSGetErrorString" => api.lms_get_error_string(arg(0)),
                "LMSGetDiagnostic" => api.lms_get_diagnostic(arg(0)),
                other => return Err(ApiCallError::UnknownMethod(other.to_string())),
            },
            Self::Scorm2004(api) => match method {
                "Initialize" => api.initialize(arg(0)),
                "Terminate" => api.terminate(arg(0)),
                "GetValue" => api.get_value(arg(0)),
                "SetValue" => api.set_value(arg(0), arg(1)),
                "Commit" => api.commit(arg(0)),
                "GetLastError" => api.get_last_error(),
                "GetErrorString" => api.get_error_string(arg(0)),
                "GetDiagnostic" => api.get_diagnostic(arg(0)),
                other => return Err(ApiCallError::UnknownMethod(other.to_string())),
            },
        };
        Ok(result)
    }
}
