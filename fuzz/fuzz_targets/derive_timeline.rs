#![no_main]

use issueline_core::collab::PayloadCollaborators;
use issueline_core::config::TimelineConfig;
use issueline_core::dates::parse_timestamp;
use issueline_core::model::Issue;
use issueline_core::timeline::derive_timeline;
use libfuzzer_sys::fuzz_target;

// Any payload that parses must either fail cleanly or keep the dwell total
// equal to the issue age on every snapshot.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(issue) = Issue::from_json(text) else {
        return;
    };
    let Ok(end_date) = parse_timestamp("end_date", "2030-01-01T00:00:00Z") else {
        return;
    };
    let config = TimelineConfig::new(end_date);
    let collab = PayloadCollaborators::for_issue(&issue);
    if let Ok(actions) = derive_timeline(&issue, &config, collab.as_collaborators()) {
        for action in &actions {
            assert_eq!(action.status_dwell.total(), action.issue_age);
        }
    }
});
