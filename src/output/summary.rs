use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::calendar::Event;

pub const NO_LOCATION: &str = "No location provided";
pub const NO_COLOR_ID: &str = "No color ID provided";

fn format_attendees(attendees: &[String]) -> String {
    let quoted: Vec<String> = attendees.iter().map(|email| format!("'{}'", email)).collect();
    format!("[{}]", quoted.join(", "))
}

pub fn write_event<W: Write>(sink: &mut W, event: &Event) -> io::Result<()> {
    writeln!(sink, "{} to {} - {}", event.start, event.end, event.summary)?;
    writeln!(
        sink,
        "Location: {}",
        event.location.as_deref().unwrap_or(NO_LOCATION)
    )?;
    writeln!(sink, "Attendees: {}", format_attendees(&event.attendees))?;
    writeln!(
        sink,
        "Color ID: {}",
        event.color_id.as_deref().unwrap_or(NO_COLOR_ID)
    )?;
    writeln!(sink)
}

/// Renders events in the order given, one blank-line-terminated block each.
pub fn write_events<W: Write>(sink: &mut W, events: &[Event]) -> io::Result<()> {
    for event in events {
        write_event(sink, event)?;
    }
    Ok(())
}

pub fn write_to_file(path: &Path, events: &[Event]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = BufWriter::new(File::create(path)?);
    write_events(&mut writer, events)?;
    writer.flush()?;
    tracing::info!("Wrote {} events to {}", events.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::EventTime;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use tempfile::TempDir;

    fn format_events(events: &[Event]) -> String {
        let mut buffer = Vec::new();
        write_events(&mut buffer, events).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    fn standup() -> Event {
        Event::new(
            EventTime::Timed("2024-01-01T09:00:00".to_string()),
            EventTime::Timed("2024-01-01T09:15:00".to_string()),
            "Standup",
        )
    }

    #[test]
    fn event_without_optional_fields_uses_defaults() {
        let output = format_events(&[standup()]);

        assert_eq!(
            output,
            "2024-01-01T09:00:00 to 2024-01-01T09:15:00 - Standup\n\
             Location: No location provided\n\
             Attendees: []\n\
             Color ID: No color ID provided\n\
             \n"
        );
    }

    #[test]
    fn populated_event_renders_every_field() {
        let event = Event::new(
            EventTime::AllDay("2024-02-10".to_string()),
            EventTime::AllDay("2024-02-11".to_string()),
            "Offsite",
        )
        .with_location("Lisbon")
        .with_attendees(["a@example.com", "b@example.com"])
        .with_color_id("5");

        let output = format_events(&[event]);

        assert_eq!(
            output,
            "2024-02-10 to 2024-02-11 - Offsite\n\
             Location: Lisbon\n\
             Attendees: ['a@example.com', 'b@example.com']\n\
             Color ID: 5\n\
             \n"
        );
    }

    #[test]
    fn events_keep_received_order() {
        let later = Event::new(
            EventTime::Timed("2024-01-01T10:00:00".to_string()),
            EventTime::Timed("2024-01-01T11:00:00".to_string()),
            "Planning",
        );

        let output = format_events(&[later, standup()]);

        let planning = output.find("Planning").unwrap();
        let standup = output.find("Standup").unwrap();
        assert!(planning < standup);
    }

    #[test]
    fn empty_sequence_renders_nothing() {
        assert_eq!(format_events(&[]), "");
    }

    #[test]
    fn write_to_file_creates_output() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out").join("output.txt");

        write_to_file(&path, &[standup()]).unwrap();

        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            format_events(&[standup()])
        );
    }

    fn arb_event() -> impl Strategy<Value = Event> {
        (
            "[A-Za-z][A-Za-z ]{0,20}",
            proptest::option::of("[A-Za-z ]{1,20}"),
            proptest::collection::vec("[a-z]{1,8}@example\\.com", 0..4),
            proptest::option::of("[0-9]{1,2}"),
        )
            .prop_map(|(summary, location, attendees, color_id)| Event {
                start: EventTime::Timed("2024-01-01T09:00:00".to_string()),
                end: EventTime::Timed("2024-01-01T10:00:00".to_string()),
                summary,
                location,
                attendees,
                color_id,
            })
    }

    proptest! {
        #[test]
        fn produces_one_block_per_event(events in proptest::collection::vec(arb_event(), 0..10)) {
            let output = format_events(&events);
            let blocks: Vec<&str> = output.split_terminator("\n\n").collect();

            prop_assert_eq!(blocks.len(), events.len());
            for (block, event) in blocks.iter().zip(&events) {
                let lines: Vec<&str> = block.lines().collect();
                let suffix = format!(" - {}", event.summary);
                prop_assert_eq!(lines.len(), 4);
                prop_assert!(lines[0].ends_with(&suffix));
                prop_assert!(lines[1].starts_with("Location: "));
                prop_assert!(lines[2].starts_with("Attendees: ["));
                prop_assert!(lines[3].starts_with("Color ID: "));
                if event.location.is_none() {
                    prop_assert_eq!(lines[1], "Location: No location provided");
                }
                if event.color_id.is_none() {
                    prop_assert_eq!(lines[3], "Color ID: No color ID provided");
                }
            }
        }

        #[test]
        fn formatting_is_idempotent(events in proptest::collection::vec(arb_event(), 0..10)) {
            prop_assert_eq!(format_events(&events), format_events(&events));
        }
    }
}
