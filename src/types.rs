/// Identifier of an original record.
/// Example: `rec-42-org`
pub type RecordId = String;
/// Identifier assigned to an accepted duplicate.
/// Example: `rec-42-org-dup-0`
pub type DuplicateId = String;
/// Name of a record attribute.
/// Examples: `surname`, `postcode`, `dob`
pub type FieldName = String;
/// Raw string value held by a field.
/// Examples: `smith`, `2913`, `19770412`
pub type FieldValue = String;
/// Order-independent serialization of a record's field/value pairs (identifier excluded).
/// Example: `[('city','perth'),('surname','smith')]`
pub type CanonicalForm = String;
