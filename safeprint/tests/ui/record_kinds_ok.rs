use safeprint::Record;

const KEEP: usize = 4;

#[derive(Record)]
#[sensitive("$.session", Structural)]
struct Account {
    #[sensitive]
    password: String,
    #[sensitive(Fixed)]
    pin: u16,
    #[sensitive("$.card.pan", "$.card.cvv", Structural)]
    wallet: std::collections::BTreeMap<String, String>,
    #[sensitive("$.token", EncodedText)]
    metadata: String,
    #[sensitive(Partial(0, KEEP))]
    iban: String,
    session: Option<String>,
}

fn main() {}
