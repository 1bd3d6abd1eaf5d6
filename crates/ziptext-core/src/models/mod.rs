pub mod upload;

pub use upload::{
    format_size_label, project_name_from_filename, NewUploadRecord, ProjectTextResponse,
    UploadRecord, UploadRecordResponse,
};
