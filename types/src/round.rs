//! Persisted round state.
//!
//! Rounds are stored as an explicit tagged-variant type per game rather
//! than an opaque blob: every field is validated when the round is read
//! back, so malformed or truncated state fails at the storage boundary
//! instead of miscomputing mid-round.
//!
//! The envelope carries the provably-fair inputs captured at round start
//! (client seed, nonce, server-seed commitment) plus the optimistic
//! concurrency `version` bumped on every persisted transition.

use crate::cards::{is_valid_code, DeckState, CARDS_PER_DECK};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, ReadRangeExt, Write};
use serde::{Deserialize, Serialize};

/// Maximum number of hands a Blackjack round can hold (splits).
pub const MAX_HANDS: usize = 4;

/// Maximum cards in a single blackjack hand.
pub const MAX_HAND_CARDS: usize = 11;

/// Maximum accepted client-seed length in bytes.
pub const MAX_CLIENT_SEED_LEN: usize = 256;

/// SHA-256 commitment to a server seed.
pub type Commitment = [u8; 32];

fn write_commitment(commitment: &Commitment, writer: &mut impl BufMut) {
    writer.put_slice(commitment);
}

fn read_commitment(reader: &mut impl Buf) -> Result<Commitment, Error> {
    if reader.remaining() < 32 {
        return Err(Error::EndOfBuffer);
    }
    let mut commitment = [0u8; 32];
    reader.copy_to_slice(&mut commitment);
    Ok(commitment)
}

/// Helper to write a string as length-prefixed UTF-8 bytes.
pub fn write_string(s: &str, writer: &mut impl BufMut) {
    let bytes = s.as_bytes();
    (bytes.len() as u32).write(writer);
    writer.put_slice(bytes);
}

/// Helper to read a string from length-prefixed UTF-8 bytes.
pub fn read_string(reader: &mut impl Buf, max_len: usize) -> Result<String, Error> {
    let len = u32::read(reader)? as usize;
    if len > max_len {
        return Err(Error::Invalid("String", "too long"));
    }
    if reader.remaining() < len {
        return Err(Error::EndOfBuffer);
    }
    let mut bytes = vec![0u8; len];
    reader.copy_to_slice(&mut bytes);
    String::from_utf8(bytes).map_err(|_| Error::Invalid("String", "invalid UTF-8"))
}

/// Helper to get encode size of a string.
pub fn string_encode_size(s: &str) -> usize {
    4 + s.len()
}

/// Which game a round is playing.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameKind {
    Blackjack = 0,
    HiLo = 1,
}

/// Round lifecycle status.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    InPlay = 0,
    Settled = 1,
}

/// Blackjack round stages.
///
/// `InsuranceOffer` is entered only on a dealer Ace upcard: the hole card
/// has been peeked but the result is withheld until the player takes (or
/// declines) insurance, or plays any main action.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlackjackStage {
    InsuranceOffer = 0,
    PlayerTurn = 1,
    Settled = 2,
}

impl TryFrom<u8> for BlackjackStage {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::InsuranceOffer),
            1 => Ok(Self::PlayerTurn),
            2 => Ok(Self::Settled),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

/// Per-hand progress within a blackjack round.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandStatus {
    Playing = 0,
    Standing = 1,
    Busted = 2,
    Blackjack = 3,
}

impl TryFrom<u8> for HandStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Playing),
            1 => Ok(Self::Standing),
            2 => Ok(Self::Busted),
            3 => Ok(Self::Blackjack),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

/// Settled result of a single hand.
///
/// `Bust` is kept distinct from `Lose`: a busted hand loses regardless of
/// the dealer's total, including when the dealer also busts.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandOutcome {
    Win = 0,
    Lose = 1,
    Push = 2,
    Bust = 3,
}

impl TryFrom<u8> for HandOutcome {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Win),
            1 => Ok(Self::Lose),
            2 => Ok(Self::Push),
            3 => Ok(Self::Bust),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

/// One player hand: cards in draw order plus its wager state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlackjackHand {
    pub cards: Vec<u8>,
    /// Base wager; a double-down doubles the effective wager without
    /// touching this field.
    pub bet: u64,
    pub doubled: bool,
    pub was_split: bool,
    pub status: HandStatus,
    pub outcome: Option<HandOutcome>,
    /// Total amount returned for this hand (stake included), set at
    /// settlement.
    pub payout: Option<u64>,
}

impl BlackjackHand {
    /// Effective wager on the hand (doubles included).
    pub fn wagered(&self) -> u64 {
        if self.doubled {
            self.bet.saturating_mul(2)
        } else {
            self.bet
        }
    }
}

impl Write for BlackjackHand {
    fn write(&self, writer: &mut impl BufMut) {
        self.cards.write(writer);
        self.bet.write(writer);
        self.doubled.write(writer);
        self.was_split.write(writer);
        (self.status as u8).write(writer);
        match self.outcome {
            Some(outcome) => {
                true.write(writer);
                (outcome as u8).write(writer);
            }
            None => false.write(writer),
        }
        self.payout.write(writer);
    }
}

impl Read for BlackjackHand {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let cards = Vec::<u8>::read_range(reader, 0..=MAX_HAND_CARDS)?;
        if cards.iter().any(|&code| !is_valid_code(code)) {
            return Err(Error::Invalid("BlackjackHand", "card code out of range"));
        }
        let bet = u64::read(reader)?;
        let doubled = bool::read(reader)?;
        let was_split = bool::read(reader)?;
        let status = HandStatus::try_from(u8::read(reader)?)?;
        let outcome = if bool::read(reader)? {
            Some(HandOutcome::try_from(u8::read(reader)?)?)
        } else {
            None
        };
        let payout = Option::<u64>::read(reader)?;
        Ok(Self {
            cards,
            bet,
            doubled,
            was_split,
            status,
            outcome,
            payout,
        })
    }
}

impl EncodeSize for BlackjackHand {
    fn encode_size(&self) -> usize {
        self.cards.encode_size()
            + self.bet.encode_size()
            + self.doubled.encode_size()
            + self.was_split.encode_size()
            + 1
            + 1
            + if self.outcome.is_some() { 1 } else { 0 }
            + self.payout.encode_size()
    }
}

/// Dealer hand. `cards[0]` is the upcard, `cards[1]` the hole card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealerHand {
    pub cards: Vec<u8>,
    /// True once the hole card is public (dealer turn or immediate
    /// peek settlement).
    pub hole_revealed: bool,
    /// True once the hole card has been inspected for a natural.
    pub peeked: bool,
}

impl DealerHand {
    pub fn upcard(&self) -> u8 {
        self.cards[0]
    }

    pub fn hole(&self) -> u8 {
        self.cards[1]
    }
}

impl Write for DealerHand {
    fn write(&self, writer: &mut impl BufMut) {
        self.cards.write(writer);
        self.hole_revealed.write(writer);
        self.peeked.write(writer);
    }
}

impl Read for DealerHand {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let cards = Vec::<u8>::read_range(reader, 2..=MAX_HAND_CARDS)?;
        if cards.iter().any(|&code| !is_valid_code(code)) {
            return Err(Error::Invalid("DealerHand", "card code out of range"));
        }
        Ok(Self {
            cards,
            hole_revealed: bool::read(reader)?,
            peeked: bool::read(reader)?,
        })
    }
}

impl EncodeSize for DealerHand {
    fn encode_size(&self) -> usize {
        self.cards.encode_size() + self.hole_revealed.encode_size() + self.peeked.encode_size()
    }
}

/// Insurance side wager, resolved against the peeked hole card.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Insurance {
    pub stake: u64,
    /// Total returned (3x the stake on a dealer natural, 0 otherwise).
    pub payout: u64,
}

impl Write for Insurance {
    fn write(&self, writer: &mut impl BufMut) {
        self.stake.write(writer);
        self.payout.write(writer);
    }
}

impl Read for Insurance {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            stake: u64::read(reader)?,
            payout: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Insurance {
    fn encode_size(&self) -> usize {
        self.stake.encode_size() + self.payout.encode_size()
    }
}

/// Optional side wagers placed at round start.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideBets {
    pub perfect_pairs: u64,
    pub twenty_one_plus_three: u64,
}

impl Write for SideBets {
    fn write(&self, writer: &mut impl BufMut) {
        self.perfect_pairs.write(writer);
        self.twenty_one_plus_three.write(writer);
    }
}

impl Read for SideBets {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            perfect_pairs: u64::read(reader)?,
            twenty_one_plus_three: u64::read(reader)?,
        })
    }
}

impl EncodeSize for SideBets {
    fn encode_size(&self) -> usize {
        self.perfect_pairs.encode_size() + self.twenty_one_plus_three.encode_size()
    }
}

/// Main-bet settlement totals, stored once and returned verbatim on
/// re-reads of a settled round.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub wagered: u64,
    pub returned: u64,
}

impl Write for Settlement {
    fn write(&self, writer: &mut impl BufMut) {
        self.wagered.write(writer);
        self.returned.write(writer);
    }
}

impl Read for Settlement {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            wagered: u64::read(reader)?,
            returned: u64::read(reader)?,
        })
    }
}

impl EncodeSize for Settlement {
    fn encode_size(&self) -> usize {
        self.wagered.encode_size() + self.returned.encode_size()
    }
}

/// Full blackjack round state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlackjackRound {
    pub stage: BlackjackStage,
    pub deck: DeckState,
    pub hands: Vec<BlackjackHand>,
    pub active_hand: u8,
    pub dealer: DealerHand,
    pub side_bets: SideBets,
    /// Side-bet returns, resolved at deal (independent of the main hand).
    pub perfect_pairs_return: u64,
    pub twenty_one_plus_three_return: u64,
    pub insurance: Option<Insurance>,
    pub actions_count: u32,
    pub settlement: Option<Settlement>,
}

impl BlackjackRound {
    /// Cards currently dealt out of the shoe, in hands plus the dealer's.
    fn cards_in_play(&self) -> impl Iterator<Item = u8> + '_ {
        self.hands
            .iter()
            .flat_map(|hand| hand.cards.iter().copied())
            .chain(self.dealer.cards.iter().copied())
    }

    /// Structural invariants that cannot be expressed per-field.
    fn validate(&self) -> Result<(), Error> {
        if self.stage == BlackjackStage::PlayerTurn
            && (self.active_hand as usize) >= self.hands.len()
        {
            return Err(Error::Invalid("BlackjackRound", "active hand out of range"));
        }
        if (self.stage == BlackjackStage::Settled) != self.settlement.is_some() {
            return Err(Error::Invalid("BlackjackRound", "settlement/stage mismatch"));
        }

        // Every dealt card must be absent from the shoe and the total
        // dealt must equal the shoe's draw counter.
        let mut dealt = 0usize;
        let mut seen = [false; CARDS_PER_DECK as usize];
        for &code in &self.deck.remaining {
            seen[code as usize] = true;
        }
        for code in self.cards_in_play() {
            if seen[code as usize] {
                return Err(Error::Invalid("BlackjackRound", "card dealt twice"));
            }
            seen[code as usize] = true;
            dealt += 1;
        }
        if dealt != self.deck.draws as usize {
            return Err(Error::Invalid("BlackjackRound", "draw counter mismatch"));
        }
        Ok(())
    }
}

impl Write for BlackjackRound {
    fn write(&self, writer: &mut impl BufMut) {
        (self.stage as u8).write(writer);
        self.deck.write(writer);
        self.hands.write(writer);
        (self.active_hand).write(writer);
        self.dealer.write(writer);
        self.side_bets.write(writer);
        self.perfect_pairs_return.write(writer);
        self.twenty_one_plus_three_return.write(writer);
        match &self.insurance {
            Some(insurance) => {
                true.write(writer);
                insurance.write(writer);
            }
            None => false.write(writer),
        }
        self.actions_count.write(writer);
        match &self.settlement {
            Some(settlement) => {
                true.write(writer);
                settlement.write(writer);
            }
            None => false.write(writer),
        }
    }
}

impl Read for BlackjackRound {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let stage = BlackjackStage::try_from(u8::read(reader)?)?;
        let deck = DeckState::read(reader)?;
        let hands = Vec::<BlackjackHand>::read_range(reader, 1..=MAX_HANDS)?;
        let active_hand = u8::read(reader)?;
        let dealer = DealerHand::read(reader)?;
        let side_bets = SideBets::read(reader)?;
        let perfect_pairs_return = u64::read(reader)?;
        let twenty_one_plus_three_return = u64::read(reader)?;
        let insurance = if bool::read(reader)? {
            Some(Insurance::read(reader)?)
        } else {
            None
        };
        let actions_count = u32::read(reader)?;
        let settlement = if bool::read(reader)? {
            Some(Settlement::read(reader)?)
        } else {
            None
        };
        let round = Self {
            stage,
            deck,
            hands,
            active_hand,
            dealer,
            side_bets,
            perfect_pairs_return,
            twenty_one_plus_three_return,
            insurance,
            actions_count,
            settlement,
        };
        round.validate()?;
        Ok(round)
    }
}

impl EncodeSize for BlackjackRound {
    fn encode_size(&self) -> usize {
        1 + self.deck.encode_size()
            + self.hands.encode_size()
            + self.active_hand.encode_size()
            + self.dealer.encode_size()
            + self.side_bets.encode_size()
            + self.perfect_pairs_return.encode_size()
            + self.twenty_one_plus_three_return.encode_size()
            + 1
            + self.insurance.as_ref().map_or(0, |i| i.encode_size())
            + self.actions_count.encode_size()
            + 1
            + self.settlement.as_ref().map_or(0, |s| s.encode_size())
    }
}

/// Hi-Lo prediction sides.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiLoPrediction {
    Higher = 0,
    Lower = 1,
    Equal = 2,
}

impl TryFrom<u8> for HiLoPrediction {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Self::Higher),
            1 => Ok(Self::Lower),
            2 => Ok(Self::Equal),
            _ => Err(Error::InvalidEnum(value)),
        }
    }
}

/// Stored Hi-Lo settlement, returned verbatim on any action against a
/// settled round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HiLoSettlement {
    pub prediction: HiLoPrediction,
    pub wager: u64,
    /// Multiplier locked at bet time, in hundredths.
    pub multiplier_x100: u64,
    /// Card drawn to resolve the bet.
    pub drawn: u8,
    pub won: bool,
    /// Total returned (0 on a loss).
    pub payout: u64,
}

impl Write for HiLoSettlement {
    fn write(&self, writer: &mut impl BufMut) {
        (self.prediction as u8).write(writer);
        self.wager.write(writer);
        self.multiplier_x100.write(writer);
        self.drawn.write(writer);
        self.won.write(writer);
        self.payout.write(writer);
    }
}

impl Read for HiLoSettlement {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            prediction: HiLoPrediction::try_from(u8::read(reader)?)?,
            wager: u64::read(reader)?,
            multiplier_x100: u64::read(reader)?,
            drawn: u8::read(reader)?,
            won: bool::read(reader)?,
            payout: u64::read(reader)?,
        })
    }
}

impl EncodeSize for HiLoSettlement {
    fn encode_size(&self) -> usize {
        1 + self.wager.encode_size()
            + self.multiplier_x100.encode_size()
            + self.drawn.encode_size()
            + self.won.encode_size()
            + self.payout.encode_size()
    }
}

/// Full Hi-Lo round state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HiLoRound {
    pub deck: DeckState,
    /// Reference card the next prediction compares against.
    pub current_card: u8,
    /// Every card drawn this round, in draw order (reference card
    /// included).
    pub history: Vec<u8>,
    pub skips: u32,
    pub settlement: Option<HiLoSettlement>,
}

impl HiLoRound {
    fn validate(&self) -> Result<(), Error> {
        let Some(&last_drawn) = self.history.last() else {
            return Err(Error::Invalid("HiLoRound", "no cards drawn"));
        };
        if self.history.len() != self.deck.draws as usize {
            return Err(Error::Invalid("HiLoRound", "draw counter mismatch"));
        }
        if !self.history.iter().all(|&code| is_valid_code(code)) {
            return Err(Error::Invalid("HiLoRound", "card code out of range"));
        }
        let expected_current = match &self.settlement {
            // The resolving draw is recorded in both history and the
            // settlement; the reference card is the one before it.
            Some(settlement) => {
                if self.history.len() < 2 || last_drawn != settlement.drawn {
                    return Err(Error::Invalid("HiLoRound", "settlement/history mismatch"));
                }
                self.history[self.history.len() - 2]
            }
            None => last_drawn,
        };
        if self.current_card != expected_current {
            return Err(Error::Invalid("HiLoRound", "current card mismatch"));
        }
        let mut seen = [false; CARDS_PER_DECK as usize];
        for &code in &self.deck.remaining {
            seen[code as usize] = true;
        }
        for &code in &self.history {
            if seen[code as usize] {
                return Err(Error::Invalid("HiLoRound", "card drawn twice"));
            }
            seen[code as usize] = true;
        }
        Ok(())
    }
}

impl Write for HiLoRound {
    fn write(&self, writer: &mut impl BufMut) {
        self.deck.write(writer);
        self.current_card.write(writer);
        self.history.write(writer);
        self.skips.write(writer);
        match &self.settlement {
            Some(settlement) => {
                true.write(writer);
                settlement.write(writer);
            }
            None => false.write(writer),
        }
    }
}

impl Read for HiLoRound {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let round = Self {
            deck: DeckState::read(reader)?,
            current_card: u8::read(reader)?,
            history: Vec::<u8>::read_range(reader, 1..=CARDS_PER_DECK as usize)?,
            skips: u32::read(reader)?,
            settlement: if bool::read(reader)? {
                Some(HiLoSettlement::read(reader)?)
            } else {
                None
            },
        };
        round.validate()?;
        Ok(round)
    }
}

impl EncodeSize for HiLoRound {
    fn encode_size(&self) -> usize {
        self.deck.encode_size()
            + self.current_card.encode_size()
            + self.history.encode_size()
            + self.skips.encode_size()
            + 1
            + self.settlement.as_ref().map_or(0, |s| s.encode_size())
    }
}

/// Game-specific round state.
#[derive(Clone, Debug, PartialEq, Eq)]
#[allow(clippy::large_enum_variant)]
pub enum GameRound {
    Blackjack(BlackjackRound),
    HiLo(HiLoRound),
}

impl GameRound {
    pub fn kind(&self) -> GameKind {
        match self {
            Self::Blackjack(_) => GameKind::Blackjack,
            Self::HiLo(_) => GameKind::HiLo,
        }
    }
}

impl Write for GameRound {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Blackjack(round) => {
                0u8.write(writer);
                round.write(writer);
            }
            Self::HiLo(round) => {
                1u8.write(writer);
                round.write(writer);
            }
        }
    }
}

impl Read for GameRound {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let kind = u8::read(reader)?;
        match kind {
            0 => Ok(Self::Blackjack(BlackjackRound::read(reader)?)),
            1 => Ok(Self::HiLo(HiLoRound::read(reader)?)),
            _ => Err(Error::InvalidEnum(kind)),
        }
    }
}

impl EncodeSize for GameRound {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Blackjack(round) => round.encode_size(),
            Self::HiLo(round) => round.encode_size(),
        }
    }
}

/// A round and the provably-fair inputs it captured at start.
///
/// The `commitment` pins the server seed for the round's whole life: seed
/// rotation never changes the draw sequence of a round already underway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Round {
    pub id: u64,
    pub user: u64,
    pub client_seed: String,
    pub nonce: u64,
    pub commitment: Commitment,
    /// Optimistic concurrency token, bumped on every persisted transition.
    pub version: u64,
    pub game: GameRound,
}

impl Round {
    pub fn status(&self) -> RoundStatus {
        let settled = match &self.game {
            GameRound::Blackjack(round) => round.stage == BlackjackStage::Settled,
            GameRound::HiLo(round) => round.settlement.is_some(),
        };
        if settled {
            RoundStatus::Settled
        } else {
            RoundStatus::InPlay
        }
    }
}

impl Write for Round {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        self.user.write(writer);
        write_string(&self.client_seed, writer);
        self.nonce.write(writer);
        write_commitment(&self.commitment, writer);
        self.version.write(writer);
        self.game.write(writer);
    }
}

impl Read for Round {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: u64::read(reader)?,
            user: u64::read(reader)?,
            client_seed: read_string(reader, MAX_CLIENT_SEED_LEN)?,
            nonce: u64::read(reader)?,
            commitment: read_commitment(reader)?,
            version: u64::read(reader)?,
            game: GameRound::read(reader)?,
        })
    }
}

impl EncodeSize for Round {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + self.user.encode_size()
            + string_encode_size(&self.client_seed)
            + self.nonce.encode_size()
            + 32
            + self.version.encode_size()
            + self.game.encode_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_codec::{DecodeExt as _, Encode};

    fn dealt_blackjack_round() -> BlackjackRound {
        let mut deck = DeckState::fresh();
        // Deal order: player, dealer up, player, dealer hole.
        let p1 = deck.take(0);
        let up = deck.take(0);
        let p2 = deck.take(0);
        let hole = deck.take(0);
        BlackjackRound {
            stage: BlackjackStage::PlayerTurn,
            deck,
            hands: vec![BlackjackHand {
                cards: vec![p1, p2],
                bet: 100,
                doubled: false,
                was_split: false,
                status: HandStatus::Playing,
                outcome: None,
                payout: None,
            }],
            active_hand: 0,
            dealer: DealerHand {
                cards: vec![up, hole],
                hole_revealed: false,
                peeked: false,
            },
            side_bets: SideBets::default(),
            perfect_pairs_return: 0,
            twenty_one_plus_three_return: 0,
            insurance: None,
            actions_count: 0,
            settlement: None,
        }
    }

    fn round_envelope(game: GameRound) -> Round {
        Round {
            id: 7,
            user: 42,
            client_seed: "lucky".to_string(),
            nonce: 3,
            commitment: [0xAB; 32],
            version: 1,
            game,
        }
    }

    #[test]
    fn test_blackjack_round_codec_roundtrip() {
        let round = round_envelope(GameRound::Blackjack(dealt_blackjack_round()));
        let encoded = round.encode();
        let decoded = Round::decode(encoded.as_ref()).expect("decode");
        assert_eq!(decoded, round);
        assert_eq!(decoded.status(), RoundStatus::InPlay);
    }

    #[test]
    fn test_blackjack_codec_rejects_duplicate_deal() {
        let mut inner = dealt_blackjack_round();
        // Claim a card that is still in the shoe.
        inner.hands[0].cards[0] = inner.deck.remaining[0];
        let encoded = round_envelope(GameRound::Blackjack(inner)).encode();
        assert!(Round::decode(encoded.as_ref()).is_err());
    }

    #[test]
    fn test_blackjack_codec_rejects_draw_counter_drift() {
        let mut inner = dealt_blackjack_round();
        inner.deck.draws += 1;
        inner.deck.remaining.pop();
        let encoded = round_envelope(GameRound::Blackjack(inner)).encode();
        assert!(Round::decode(encoded.as_ref()).is_err());
    }

    #[test]
    fn test_blackjack_codec_rejects_settlement_mismatch() {
        let mut inner = dealt_blackjack_round();
        inner.settlement = Some(Settlement {
            wagered: 100,
            returned: 200,
        });
        let encoded = round_envelope(GameRound::Blackjack(inner)).encode();
        assert!(Round::decode(encoded.as_ref()).is_err());
    }

    #[test]
    fn test_hilo_round_codec_roundtrip() {
        let mut deck = DeckState::fresh();
        let first = deck.take(3);
        let round = round_envelope(GameRound::HiLo(HiLoRound {
            deck,
            current_card: first,
            history: vec![first],
            skips: 0,
            settlement: None,
        }));
        let encoded = round.encode();
        let decoded = Round::decode(encoded.as_ref()).expect("decode");
        assert_eq!(decoded, round);
    }

    #[test]
    fn test_hilo_codec_rejects_current_card_mismatch() {
        let mut deck = DeckState::fresh();
        let first = deck.take(3);
        let other = deck.remaining[0];
        let round = round_envelope(GameRound::HiLo(HiLoRound {
            deck,
            current_card: other,
            history: vec![first],
            skips: 0,
            settlement: None,
        }));
        let encoded = round.encode();
        assert!(Round::decode(encoded.as_ref()).is_err());
    }

    #[test]
    fn test_round_codec_rejects_truncation() {
        let round = round_envelope(GameRound::Blackjack(dealt_blackjack_round()));
        let encoded = round.encode();
        let bytes = encoded.as_ref();
        for cut in [0, 1, bytes.len() / 2, bytes.len() - 1] {
            assert!(
                Round::decode(&bytes[..cut]).is_err(),
                "truncation at {} must fail",
                cut
            );
        }
    }

    #[test]
    fn test_decode_survives_arbitrary_bytes() {
        // Random byte soup must never panic and must never produce an
        // inconsistent round.
        use rand::{rngs::StdRng, RngCore, SeedableRng};
        let mut rng = StdRng::seed_from_u64(0xdea1_c0de);
        for _ in 0..500 {
            let len = (rng.next_u32() as usize) % 256;
            let mut bytes = vec![0u8; len];
            rng.fill_bytes(&mut bytes);
            if let Ok(round) = Round::decode(bytes.as_slice()) {
                // Anything that decodes satisfied every invariant.
                let _ = round.status();
            }
        }
    }

    #[test]
    fn test_settled_status() {
        let mut inner = dealt_blackjack_round();
        inner.stage = BlackjackStage::Settled;
        inner.settlement = Some(Settlement {
            wagered: 100,
            returned: 0,
        });
        inner.hands[0].status = HandStatus::Busted;
        inner.hands[0].outcome = Some(HandOutcome::Bust);
        inner.hands[0].payout = Some(0);
        let round = round_envelope(GameRound::Blackjack(inner));
        assert_eq!(round.status(), RoundStatus::Settled);
    }
}
