use thiserror::Error;

use crate::data::UserId;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("unknown attribute `{0}`; expected connections, duration or frequency")]
    MissingAttribute(String),

    #[error("user {0} is not part of the loaded graph")]
    UnknownNode(UserId),

    #[error("user {user} has an unparseable check-in time `{value}`")]
    InvalidTimestamp { user: UserId, value: String },

    #[error("user {0} appears more than once in the dataset")]
    DuplicateUser(UserId),
}

pub type Result<T> = std::result::Result<T, GraphError>;
