/// Backend job identifiers are opaque strings (Celery task ids in practice).
pub type JobId = String;

/// Progress is reported as a whole percentage.
pub type Percent = u8;
