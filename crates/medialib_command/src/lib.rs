//! URI to operation resolution for the media library.
//!
//! Every inbound request URI is classified into an [`OperationObject`] (what
//! kind of resource) and an [`OperationType`] (which verb), then resolved to a
//! physical table. Unknown segments never fail parsing; they become
//! `UnknownObject` / `UnknownType` and only turn into `E_INVALID_URI` when a
//! handler needs a table.
//!
//! ```
//! use medialib_command::{CommandResolver, OperationObject, OperationType};
//!
//! let resolver = CommandResolver::default();
//! let mut cmd = resolver.parse("datashare:///media/phaccess_photo_operation/create");
//! assert_eq!(cmd.object(), OperationObject::PahPhoto);
//! assert_eq!(cmd.op_type(), OperationType::Create);
//! assert_eq!(resolver.table_name(&mut cmd).unwrap(), "Photos");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod command;
mod object;
mod op_type;
mod resolver;
mod tables;
mod uri;

pub use command::{MediaLibraryCommand, distributed_table_name};
pub use object::OperationObject;
pub use op_type::OperationType;
pub use resolver::CommandResolver;
pub use tables::{OperationTables, TableNameMode, table};
pub use uri::{
    ApiVersion, AUDIO_URI_PREFIX, DATASHARE_SCHEME, MEDIA_ROOT, MEDIALIBRARY_DATA_URI,
    PHOTO_URI_PREFIX, SAVE_LOW_QUALITY_PICTURE, query_key,
};
