//! Custom assertion macros and utilities

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
    ($result:expr, $message:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("{}: {:?}", $message, e),
        }
    };
}

/// Assert that a JSON response body is the error envelope with `message`
#[macro_export]
macro_rules! assert_api_error {
    ($body:expr, $message:expr) => {
        assert_eq!($body["success"], false, "expected an error envelope: {}", $body);
        assert_eq!($body["message"], $message);
    };
}
