macro_rules! pinpoint {
    ($kind:expr, $location:expr) => {
        crate::error::Error::pinpoint($kind, $location)
    };
    ($kind:expr, $location:expr, $class:expr, $number:expr) => {
        crate::error::Error::pinpoint_with_tag($kind, $location, $class, $number)
    };
}
