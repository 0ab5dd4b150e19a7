use octofhir_hl7validator::*;

/// OML^O21 lab order with two patients' worth of order groups.
#[allow(dead_code)]
pub const LAB_ORDER: &str = "MSH|^~\\&|SrcSystem^Lab|LabFacility|TargetSystem|TargetFacility|20240101120000||OML^O21^OML_O21|MSG00001|P|2.5\r\
PID|1||12345^^^HOSP^MR||Doe^John^A||19800101|M\r\
PV1|1|I|WARD^101^1\r\
ORC|NW|ORD001\r\
OBR|1|ORD001||CBC^Complete Blood Count\r\
NTE|1||Fasting sample\r\
ORC|NW|ORD002\r\
OBR|2|ORD002||BMP^Basic Metabolic Panel\r";

#[allow(dead_code)]
pub fn lab_order() -> Message {
    Message::parse(LAB_ORDER).unwrap()
}

/// Message made of bare segments, one field each. A leading `MSH` is implied.
#[allow(dead_code)]
pub fn segments(codes: &[&str]) -> Message {
    let mut text = String::from("MSH|^~\\&|SrcSystem\r");
    for code in codes.iter().skip_while(|c| **c == "MSH") {
        text.push_str(code);
        text.push_str("|1\r");
    }
    Message::parse(&text).unwrap()
}

#[allow(dead_code)]
pub fn validate(rules: &str, message: Message) -> Context {
    Validator::new(rules).validate(message).unwrap()
}

#[allow(dead_code)]
pub fn error_tags(context: &Context) -> Vec<ViolationKind> {
    context.errors().iter().filter_map(|o| o.tag).collect()
}

#[allow(dead_code)]
pub fn error_selectors(context: &Context) -> Vec<String> {
    context
        .errors()
        .iter()
        .filter_map(|o| o.selector.clone())
        .collect()
}
