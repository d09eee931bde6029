//! Built-in formats

use super::PredicateFormat;
use crate::pointer::JsonPointer;
use chrono::NaiveDate;
use regex::Regex;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::sync::OnceLock;
use url::Url;
use uuid::Uuid;

type Check = std::result::Result<(), Option<String>>;

pub(super) fn formats() -> Vec<PredicateFormat> {
    vec![
        PredicateFormat::new("date-time", date_time),
        PredicateFormat::new("date", date),
        PredicateFormat::new("time", time),
        PredicateFormat::new("duration", duration),
        PredicateFormat::new("email", email),
        PredicateFormat::new("idn-email", idn_email),
        PredicateFormat::new("hostname", hostname),
        PredicateFormat::new("idn-hostname", idn_hostname),
        PredicateFormat::new("ipv4", ipv4),
        PredicateFormat::new("ipv6", ipv6),
        PredicateFormat::new("uri", uri),
        PredicateFormat::new("uri-reference", uri_reference),
        PredicateFormat::new("iri", iri),
        PredicateFormat::new("iri-reference", iri_reference),
        PredicateFormat::new("uri-template", uri_template),
        PredicateFormat::new("json-pointer", json_pointer),
        PredicateFormat::new("relative-json-pointer", relative_json_pointer),
        PredicateFormat::new("regex", regular_expression),
        PredicateFormat::new("uuid", hyphenated_uuid),
    ]
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("built-in format pattern is valid"))
}

fn check(ok: bool) -> Check {
    if ok {
        Ok(())
    } else {
        Err(None)
    }
}

fn date_time(s: &str) -> Check {
    let Some((day, clock)) = s.split_once(|c| c == 'T' || c == 't') else {
        return Err(Some("missing 'T' separator".to_string()));
    };
    date(day)?;
    time(clock)
}

fn date(s: &str) -> Check {
    static DATE: OnceLock<Regex> = OnceLock::new();
    if !pattern(&DATE, r"^\d{4}-\d{2}-\d{2}$").is_match(s) {
        return Err(None);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| Some(e.to_string()))
}

fn time(s: &str) -> Check {
    static TIME: OnceLock<Regex> = OnceLock::new();
    let re = pattern(
        &TIME,
        r"^(\d{2}):(\d{2}):(\d{2})(?:\.\d+)?(?:[Zz]|([+-])(\d{2}):(\d{2}))$",
    );
    let Some(caps) = re.captures(s) else {
        return Err(None);
    };
    let field = |i: usize| -> i64 {
        caps.get(i)
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };
    let (hour, minute, second) = (field(1), field(2), field(3));
    let (offset_hour, offset_minute) = (field(5), field(6));
    if hour > 23 || minute > 59 || second > 60 || offset_hour > 23 || offset_minute > 59 {
        return Err(None);
    }
    if second == 60 {
        let sign = match caps.get(4).map(|m| m.as_str()) {
            Some("-") => -1,
            _ => 1,
        };
        let utc = (hour * 60 + minute - sign * (offset_hour * 60 + offset_minute)).rem_euclid(24 * 60);
        if utc != 23 * 60 + 59 {
            return Err(Some("leap seconds only occur at 23:59:60 UTC".to_string()));
        }
    }
    Ok(())
}

fn duration(s: &str) -> Check {
    static DURATION: OnceLock<Regex> = OnceLock::new();
    let re = pattern(
        &DURATION,
        r"^P(?:(?:\d+D|\d+M(?:\d+D)?|\d+Y(?:\d+M(?:\d+D)?)?)(?:T(?:\d+H(?:\d+M(?:\d+S)?)?|\d+M(?:\d+S)?|\d+S))?|T(?:\d+H(?:\d+M(?:\d+S)?)?|\d+M(?:\d+S)?|\d+S)|\d+W)$",
    );
    check(re.is_match(s))
}

fn email_parts(s: &str) -> Option<(&str, &str)> {
    let (local, domain) = s.rsplit_once('@')?;
    let local_ok = !local.is_empty()
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && !local.chars().any(char::is_whitespace);
    local_ok.then_some((local, domain))
}

fn email_domain(domain: &str, host: fn(&str) -> Check) -> Check {
    if let Some(literal) = domain.strip_prefix('[').and_then(|d| d.strip_suffix(']')) {
        return match literal.strip_prefix("IPv6:") {
            Some(v6) => ipv6(v6),
            None => ipv4(literal),
        };
    }
    host(domain)
}

fn email(s: &str) -> Check {
    let Some((local, domain)) = email_parts(s) else {
        return Err(None);
    };
    if !local.is_ascii() {
        return Err(None);
    }
    email_domain(domain, hostname)
}

fn idn_email(s: &str) -> Check {
    let Some((_, domain)) = email_parts(s) else {
        return Err(None);
    };
    email_domain(domain, idn_hostname)
}

fn hostname(s: &str) -> Check {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let label = pattern(&LABEL, r"^[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?$");
    let s = s.strip_suffix('.').unwrap_or(s);
    check(
        !s.is_empty()
            && s.len() <= 253
            && s.split('.').all(|part| part.len() <= 63 && label.is_match(part)),
    )
}

fn idn_hostname(s: &str) -> Check {
    let s = s.strip_suffix('.').unwrap_or(s);
    let label_ok = |part: &str| {
        let count = part.chars().count();
        count > 0
            && count <= 63
            && !part.starts_with('-')
            && !part.ends_with('-')
            && part.chars().all(|c| c.is_alphanumeric() || c == '-')
    };
    check(!s.is_empty() && s.chars().count() <= 253 && s.split('.').all(label_ok))
}

fn ipv4(s: &str) -> Check {
    s.parse::<Ipv4Addr>().map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn ipv6(s: &str) -> Check {
    s.parse::<Ipv6Addr>().map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn reference_chars_ok(s: &str, ascii_only: bool) -> bool {
    let forbidden = |c: char| {
        c.is_whitespace()
            || c.is_control()
            || matches!(c, '\\' | '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`')
    };
    !s.chars().any(forbidden) && (!ascii_only || s.is_ascii())
}

fn absolute(s: &str, ascii_only: bool) -> Check {
    if !reference_chars_ok(s, ascii_only) {
        return Err(None);
    }
    Url::parse(s).map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn relative(s: &str, ascii_only: bool) -> Check {
    if !reference_chars_ok(s, ascii_only) {
        return Err(None);
    }
    static BASE: OnceLock<Url> = OnceLock::new();
    let base = BASE.get_or_init(|| Url::parse("http://reference.invalid/").expect("static base URI is valid"));
    base.join(s).map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn uri(s: &str) -> Check {
    absolute(s, true)
}

fn uri_reference(s: &str) -> Check {
    relative(s, true)
}

fn iri(s: &str) -> Check {
    absolute(s, false)
}

fn iri_reference(s: &str) -> Check {
    relative(s, false)
}

fn uri_template(s: &str) -> Check {
    static TEMPLATE: OnceLock<Regex> = OnceLock::new();
    check(pattern(&TEMPLATE, r"^(?:[^{}]|\{[^{}]+\})*$").is_match(s))
}

fn json_pointer(s: &str) -> Check {
    JsonPointer::parse(s).map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn relative_json_pointer(s: &str) -> Check {
    static RELATIVE: OnceLock<Regex> = OnceLock::new();
    check(pattern(&RELATIVE, r"^(?:0|[1-9][0-9]*)(?:#|(?:/(?:[^/~]|~[01])*)*)$").is_match(s))
}

fn regular_expression(s: &str) -> Check {
    Regex::new(s).map(|_| ()).map_err(|e| Some(e.to_string()))
}

fn hyphenated_uuid(s: &str) -> Check {
    static HYPHENATED: OnceLock<Regex> = OnceLock::new();
    let re = pattern(
        &HYPHENATED,
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$",
    );
    if !re.is_match(s) {
        return Err(None);
    }
    Uuid::parse_str(s).map(|_| ()).map_err(|e| Some(e.to_string()))
}
