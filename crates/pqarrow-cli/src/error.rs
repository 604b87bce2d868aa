use pqarrow_core::ConvertError;
use snafu::Snafu;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CliError {
    #[snafu(display(
        "Conversion from {source_dir} to {dest_dir} failed. \
         Files converted before the failure were left in place: {source}"
    ))]
    Convert {
        source_dir: String,
        dest_dir: String,
        #[snafu(source(from(ConvertError, Box::new)))]
        source: Box<ConvertError>,
    },
}
