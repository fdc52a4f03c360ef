use crate::events::WindowId;
use crate::utils::Handle;
use thiserror::Error;

/// Код результата, который видит C-хост.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Ok = 0,
    ErrorApi = 1,
    ErrorDuplicateItem = 2,
    ErrorNullPointer = 3,
    ErrorInvalidHandle = 4,
}

#[derive(Error, Debug)]
pub enum TouchError {
    #[error("Ошибка X11 API: {0}")]
    Api(String),

    #[error("Система не инициализирована: соединение с дисплеем не открыто")]
    NotInitialized,

    #[error("Обработчик для окна {0} уже создан")]
    DuplicateItem(WindowId),

    #[error("Не удалось инициализировать обработчик {handle} для окна {window}: {source}")]
    HandlerInit {
        window: WindowId,
        handle: Handle,
        #[source]
        source: Box<TouchError>,
    },

    #[error("Передан нулевой указатель")]
    NullPointer,

    #[error("Недействительный дескриптор: {0}")]
    InvalidHandle(String),

    #[error("Ошибка подключения к X-серверу: {0}")]
    Connect(#[from] x11rb::errors::ConnectError),

    #[error("Ошибка соединения X11: {0}")]
    Connection(#[from] x11rb::errors::ConnectionError),

    #[error("Ошибка ответа X11: {0}")]
    Reply(#[from] x11rb::errors::ReplyError),
}

impl TouchError {
    pub fn api<T>(msg: impl Into<String>) -> Result<T> {
        Err(TouchError::Api(msg.into()))
    }

    pub fn code(&self) -> ResultCode {
        match self {
            TouchError::DuplicateItem(_) => ResultCode::ErrorDuplicateItem,
            TouchError::NullPointer => ResultCode::ErrorNullPointer,
            TouchError::InvalidHandle(_) => ResultCode::ErrorInvalidHandle,
            TouchError::HandlerInit { source, .. } => source.code(),
            TouchError::Api(_)
            | TouchError::NotInitialized
            | TouchError::Connect(_)
            | TouchError::Connection(_)
            | TouchError::Reply(_) => ResultCode::ErrorApi,
        }
    }
}

pub type Result<T> = std::result::Result<T, TouchError>;

impl<T> From<&Result<T>> for ResultCode {
    fn from(result: &Result<T>) -> Self {
        match result {
            Ok(_) => ResultCode::Ok,
            Err(e) => e.code(),
        }
    }
}

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! touch_error {
    (api, $($arg:tt)*) => {
        $crate::error::TouchError::Api(format!($($arg)*))
    };
    (invalid_handle, $($arg:tt)*) => {
        $crate::error::TouchError::InvalidHandle(format!($($arg)*))
    };
}
