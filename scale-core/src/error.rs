//! First-class error taxonomy for the measurement core.
//!
//! Nothing in this crate panics or unwinds on a caller mistake: every public
//! entry point that can be refused returns one of these enums. Runtime
//! conditions that are not caller mistakes (overload, motion, not yet
//! calibrated...) are status bits on a reading, not errors -- see
//! [`crate::loadcell::status`].
use derive_more::Display;

/// Errors from the calibration state machine (spec.md CalError family).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CalError {
    NotAllow,
    WrongCalSequence,
    InvalidCalInfo,
    WrongSensorId,
    LessThan4CntPerD,
    DifferentValueOnSameLoad,
    CannotChangeUnit,
    NeedUnit,
    NeedUnitCap,
    NeedCountby,
    FailedCal,
    TestLoadGtCapacity,
    TestLoadTooSmall,
    InvalidCapacity,
    CannotChangeCapacity,
    CannotChangeCountby,
}

impl std::error::Error for CalError {}

/// Errors from command / input validation (spec.md Command/input family).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    IndexError,
    OutRangeInput,
    ReadOnly,
    MinGtMaxSwapped,
    CannotUpdate,
    UncalSensor,
    InvalidCountby,
    SensorNotSupported,
    InvalidSensorNumber,
    InvalidValueType,
    FeatureNotSupport,
    NotAllowInState,
}

impl std::error::Error for CommandError {}

/// System-level errors (spec.md System family).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum SystemError {
    CmdLocked,
    WrongPassword,
    OperationTimeout,
}

impl std::error::Error for SystemError {}

/// Persistence failures (spec.md Persistence family). A failed save never
/// unwinds in-RAM state: the in-RAM copy stays authoritative for the session.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum PersistError {
    NvMemoryFail,
    EememFail,
    FramFail,
}

impl std::error::Error for PersistError {}

/// Umbrella error for operations that can fail in more than one family
/// (e.g. setpoint evaluation touching both command validation and
/// persistence).
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum ScaleError {
    Cal(CalError),
    Command(CommandError),
    System(SystemError),
    Persist(PersistError),
}

impl std::error::Error for ScaleError {}

impl From<CalError> for ScaleError {
    fn from(e: CalError) -> Self {
        ScaleError::Cal(e)
    }
}
impl From<CommandError> for ScaleError {
    fn from(e: CommandError) -> Self {
        ScaleError::Command(e)
    }
}
impl From<SystemError> for ScaleError {
    fn from(e: SystemError) -> Self {
        ScaleError::System(e)
    }
}
impl From<PersistError> for ScaleError {
    fn from(e: PersistError) -> Self {
        ScaleError::Persist(e)
    }
}
