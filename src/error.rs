use std::path::PathBuf;

custom_error::custom_error! { pub PipelineError
    Io{source: std::io::Error} = "i/o error: {source}",
    RecordUnavailable{path: PathBuf} = @{
        format!("distance record missing or unreadable: {}", path.display())
    },
    MalformedDistance{token: String, location: String} =
        "malformed distance value '{token}' in {location}",
    MalformedMatrix{detail: String} = "malformed distance matrix: {detail}",
    InsufficientInput{n: usize} = "at least two samples are required, got {n}",
    ExternalTool{command: String, status: i32, stderr: String} =
        "external tool failed (exit {status}): {command}\n{stderr}",
}
