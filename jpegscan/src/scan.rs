use tracing::trace;

use crate::checkpoint::Checkpoint;
use crate::error::{ErrorKind, ErrorMessage};
use crate::options::Limits;
use crate::session::Session;
use crate::types::{Image, ImageInfo};

/// Drive a session from header to finish, handing every scanline to `on_row`.
///
/// `init` runs once the output geometry is known and before the first row is
/// read; its value is threaded through `on_row` and returned at the end.
pub(crate) fn drive<S, T>(
    session: &mut S,
    checkpoint: Checkpoint,
    limits: &Limits,
    init: impl FnOnce(&ImageInfo) -> Result<T, ErrorMessage>,
    mut on_row: impl FnMut(&mut T, u32, &[u8]),
) -> Result<T, ErrorMessage>
where
    S: Session,
{
    let info = checkpoint.call(|| {
        let header = session.read_header()?;
        limits.check(&header)?;
        session.start_decompress()
    })?;
    let stride = info.stride()?;
    let mut state = init(&info)?;

    while session.output_scanline() < info.height {
        let y = session.output_scanline();
        checkpoint.call(|| session.read_scanline())?;
        let row = session.scanline();
        if row.len() != stride {
            return Err(ErrorMessage::new(
                ErrorKind::Internal,
                format!("scanline {y} is {} bytes, expected {stride}", row.len()),
            ));
        }
        trace!(row = y, "scanline");
        on_row(&mut state, y, row);
    }

    checkpoint.call(|| session.finish_decompress())?;
    Ok(state)
}

/// Decode a whole frame into a freshly allocated [`Image`].
pub(crate) fn decode_image<S: Session>(
    session: &mut S,
    checkpoint: Checkpoint,
    limits: &Limits,
) -> Result<Image, ErrorMessage> {
    drive(session, checkpoint, limits, Image::for_info, |image, y, row| {
        image.row_mut(y).copy_from_slice(row)
    })
}
