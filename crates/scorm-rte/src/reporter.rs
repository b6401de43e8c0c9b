use crate::errors::RteFault;
use crate::lifecycle::ApiCall;
use crate::version::ScormVersion;

pub const NO_ERROR: u16 = 0;

pub const SCORM12_CATALOG: &[(u16, &str)] = &[
    (0, "No error"),
    (101, "General exception"),
    (201, "Invalid argument error"),
    (202, "Element cannot have children"),
    (203, "Element not an array - cannot have count"),
    (301, "Not initialized"),
    (401, "Not implemented error"),
    (402, "Invalid set value, element is a keyword"),
    (403, "Element is read only"),
    (404, "Element is write only"),
    (405, "Incorrect data type"),
];

pub const SCORM2004_CATALOG: &[(u16, &str)] = &[
    (0, "No Error"),
    (101, "General Exception"),
    (102, "General Initialization Failure"),
    (103, "Already Initialized"),
    (104, "Content Instance Terminated"),
    (111, "General Termination Failure"),
    (112, "Termination Before Initialization"),
    (113, "Termination After Termination"),
    (122, "Retrieve Data Before Initialization"),
    (123, "Retrieve Data After Termination"),
    (132, "Store Data Before Initialization"),
    (133, "Store Data After Termination"),
    (142, "Commit Before Initialization"),
    (143, "Commit After Termination"),
    (201, "General Argument Error"),
    (301, "General Get Failure"),
    (351, "General Set Failure"),
    (391, "General Commit Failure"),
    (401, "Undefined Data Model Element"),
    (402, "Unimplemented Data Model Element"),
    (403, "Data Model Element Value Not Initialized"),
    (404, "Data Model Element Is Read Only"),
    (405, "Data Model Element Is Write Only"),
    (406, "Data Model Element Type Mismatch"),
    (407, "Data Model Element Value Out Of Range"),
    (408, "Data Model Dependency Not Established"),
];

pub fn catalog(version: ScormVersion) -> &'static [(u16, &'static str)] {
    match version {
        ScormVersion::Scorm12 => SCORM12_CATALOG,
        ScormVersion::Scorm2004 => SCORM2004_CATALOG,
    }
}

pub fn error_string(version: ScormVersion, code: u16) -> Option<&'static str> {
    catalog(version)
        .iter()
        .find(|(candidate, _)| *candidate == code)
        .map(|(_, text)| *text)
}

pub fn fault_code(version: ScormVersion, fault: &RteFault) -> u16 {
    match version {
        ScormVersion::Scorm12 => scorm12_code(fault),
        ScormVersion::Scorm2004 => scorm2004_code(fault),
    }
}

fn scorm12_code(fault: &RteFault) -> u16 {
    match fault {
        RteFault::NotInitialized { .. } => 301,
        RteFault::AfterTermination { .. }
        | RteFault::AlreadyInitialized
        | RteFault::InstanceTerminated
        | RteFault::InitializationFailed(_)
        | RteFault::PersistenceFailed(_)
        | RteFault::General(_) => 101,
        RteFault::InvalidArgument { .. }
        | RteFault::EmptyElementName { .. }
        | RteFault::UndefinedElement(_)
        | RteFault::IndexOutOfRange(_) => 201,
        RteFault::ChildrenUnsupported(_) => 202,
        RteFault::CountUnsupported(_) => 203,
        RteFault::KeywordWrite(_) => 402,
        RteFault::ReadOnly(_) => 403,
        RteFault::WriteOnly(_) => 404,
        RteFault::TypeMismatch { .. } | RteFault::ValueOutOfRange { .. } => 405,
        // 1.2 has neither notion; reads of unset values return "" instead.
        RteFault::ValueNotInitialized(_) => 101,
        RteFault::DependencyNotEstablished { .. } => 405,
    }
}

fn scorm2004_code(fault: &RteFault) -> u16 {
    match fault {
        RteFault::NotInitialized { call } => match call {
            ApiCall::Initialize => 102,
            ApiCall::Terminate => 112,
            ApiCall::GetValue => 122,
            ApiCall::SetValue => 132,
            ApiCall::Commit => 142,
        },
        RteFault::AfterTermination { call } => match call {
            ApiCall::Initialize => 104,
            ApiCall::Terminate => 113,
            ApiCall::GetValue => 123,
            ApiCall::SetValue => 133,
            ApiCall::Commit => 143,
        },
        RteFault::AlreadyInitialized => 103,
        RteFault::InstanceTerminated => 104,
        RteFault::InitializationFailed(_) => 102,
        RteFault::InvalidArgument { .. } => 201,
        RteFault::EmptyElementName { call } => match call {
            ApiCall::SetValue => 351,
            _ => 301,
        },
        RteFault::UndefinedElement(_) => 401,
        RteFault::ReadOnly(_) | RteFault::KeywordWrite(_) => 404,
        RteFault::WriteOnly(_) => 405,
        RteFault::ChildrenUnsupported(_)
        | RteFault::CountUnsupported(_)
        | RteFault::IndexOutOfRange(_) => 301,
        RteFault::TypeMismatch { .. } => 406,
        RteFault::ValueOutOfRange { .. } => 407,
        RteFault::ValueNotInitialized(_) => 403,
        RteFault::DependencyNotEstablished { .. } => 408,
        RteFault::PersistenceFailed(_) => 391,
        RteFault::General(_) => 101,
    }
}

/// The single "last error" slot behind GetLastError, GetErrorString and
/// GetDiagnostic.
#[derive(Clone, Debug)]
pub struct ErrorReporter {
    version: ScormVersion,
    code: u16,
    diagnostic: String,
}

impl ErrorReporter {
    pub fn new(version: ScormVersion) -> Self {
        Self {
            version,
            code: NO_ERROR,
            diagnostic: String::new(),
        }
    }

    pub fn clear(&mut self) {
        self.code = NO_ERROR;
        self.diagnostic.clear();
    }

    pub fn record(&mut self, fault: &RteFault) -> u16 {
        self.code = fault_code(self.version, fault);
        self.diagnostic = fault.to_string();
        self.code
    }

    pub fn last_code(&self) -> u16 {
        self.code
    }

    pub fn last_error(&self) -> String {
        self.code.to_string()
    }

    pub fn error_string(&self, code: &str) -> String {
        parse_code(code)
            .and_then(|code| error_string(self.version, code))
            .unwrap_or_default()
            .to_string()
    }

    pub fn diagnostic(&self, code: &str) -> String {
        let trimmed = code.trim();
        if trimmed.is_empty() || parse_code(trimmed) == Some(self.code) {
            return self.diagnostic.clone();
        }
        self.error_string(trimmed)
    }
}

fn parse_code(code: &str) -> Option<u16> {
    code.trim().parse::<u16>().ok()
}
