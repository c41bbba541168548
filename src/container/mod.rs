use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

mod error;
mod resolver;

pub use error::{Error, Result};
pub use resolver::{
    CgroupLine, CgroupLineError, IdentityResolver, container_id_from_cgroup_path,
    memory_cgroup_path,
};

/// The maximum allowed length for a [`ContainerID`].
pub const CONTAINER_ID_MAX_LEN: usize = 64;

/// A validated container identifier: 1 to [`CONTAINER_ID_MAX_LEN`] characters, never
/// truncated.
///
/// Cloning is cheap; the string is shared.
///
/// # Examples
///
/// ```
/// # use docker_sysinfo::container::{ContainerID, Error};
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), raw_id);
///
/// assert!(ContainerID::new("").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or longer than
    /// [`CONTAINER_ID_MAX_LEN`] characters.
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        let len = src.chars().count();
        if len == 0 || len > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ContainerID {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ContainerID {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
