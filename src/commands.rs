use strum_macros::AsRefStr;

/// Wire-level command names.
///
/// The variant name uppercased is the exact token sent on the wire, so adding
/// a command is adding a variant. Sub-commands (CONFIG GET, SCRIPT LOAD,
/// CLUSTER NODES) are passed as the first argument of their parent command.
#[derive(AsRefStr, Clone, Copy, Debug, PartialEq)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Command {
    // strings
    Set,
    Get,
    GetSet,
    SetNx,
    SetEx,
    PSetEx,
    Append,
    StrLen,
    GetRange,
    SetRange,
    Incr,
    IncrBy,
    IncrByFloat,
    Decr,
    DecrBy,
    MGet,
    MSet,
    MSetNx,

    // keys
    Del,
    Exists,
    Type,
    Expire,
    ExpireAt,
    PExpire,
    Ttl,
    PTtl,
    Persist,
    Keys,
    Rename,
    RenameNx,
    RandomKey,
    Scan,

    // hashes
    HSet,
    HSetNx,
    HGet,
    HMSet,
    HMGet,
    HDel,
    HLen,
    HExists,
    HIncrBy,
    HIncrByFloat,
    HKeys,
    HVals,
    HGetAll,
    HScan,

    // lists
    LPush,
    RPush,
    LPushX,
    RPushX,
    LPop,
    RPop,
    LLen,
    LRange,
    LTrim,
    LIndex,
    LSet,
    LRem,
    RPopLPush,
    BLPop,
    BRPop,

    // sets
    SAdd,
    SRem,
    SPop,
    SCard,
    SIsMember,
    SMembers,
    SRandMember,
    SMove,
    SInter,
    SUnion,
    SDiff,
    SScan,

    // sorted sets
    ZAdd,
    ZRem,
    ZScore,
    ZIncrBy,
    ZCard,
    ZCount,
    ZRank,
    ZRevRank,
    ZRange,
    ZRevRange,
    ZRangeByScore,
    ZScan,

    // server / admin
    Ping,
    Echo,
    Auth,
    Select,
    Quit,
    Info,
    DbSize,
    FlushDb,
    FlushAll,
    Config,
    Cluster,

    // scripting
    Eval,
    EvalSha,
    Script,

    // pub/sub
    Publish,
    Subscribe,
    Unsubscribe,

    // transactions
    Multi,
    Exec,
    Discard,
    Watch,
    Unwatch,
}

impl Command {
    pub fn name(&self) -> &str {
        self.as_ref()
    }
}
