use std::io::Write;

use tickwatch_core::{Delivery, DeliveryStatus};

/// Prints every chunk that did not reach the channel, separated by blank lines.
///
/// Returns how many chunks were printed.
pub fn render_undelivered<'a, W, I>(out: &mut W, deliveries: I) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a Delivery>,
{
    let mut printed = 0;
    for delivery in deliveries {
        if delivery.status == DeliveryStatus::Sent {
            continue;
        }
        if printed > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{}", delivery.chunk.text())?;
        printed += 1;
    }
    out.flush()?;
    Ok(printed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickwatch_core::{ChunkKind, MessageChunk};

    fn delivery(line: &str, status: DeliveryStatus) -> Delivery {
        Delivery {
            kind: ChunkKind::Summary,
            chunk: MessageChunk {
                header: String::from("H"),
                lines: vec![line.to_owned()],
            },
            status,
        }
    }

    #[test]
    fn prints_only_undelivered_chunks() {
        let deliveries = vec![
            delivery("sent", DeliveryStatus::Sent),
            delivery("failed", DeliveryStatus::Failed {
                error: String::from("503"),
            }),
            delivery("local", DeliveryStatus::PrintOnly),
        ];
        let mut out = Vec::new();

        let printed = render_undelivered(&mut out, &deliveries).expect("write to buffer");

        assert_eq!(printed, 2);
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "H\nfailed\n\nH\nlocal\n"
        );
    }
}
