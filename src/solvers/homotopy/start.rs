//! Generic complex start system and its 64 solutions.

/// Lines `[d1, p1, d2, p2]` of the six correspondences, each coordinate as `[re, im]`.
pub(super) static LINES: [[[[f64; 2]; 3]; 4]; 6] = [
    [
        [
            [1.084550289637804, 0.6947033555535327],
            [-0.07197038680403145, -0.1939145749848499],
            [1.8176378160798565, -0.20421382127087234],
        ],
        [
            [-0.5550331288609748, -0.8049303137731189],
            [0.0675009954555777, 0.10275213669321846],
            [-0.24385680221677403, -0.04395258840614128],
        ],
        [
            [0.19310520893135588, 0.4895989119555033],
            [0.7755562192692302, 0.1483624019144789],
            [-1.2655664731922485, 0.49619426999607785],
        ],
        [
            [-0.1451986920341659, -0.13341074049541174],
            [0.4186291858563924, 0.019246356095019207],
            [0.16707226452755541, 0.9450496484831531],
        ],
    ],
    [
        [
            [2.333670304563735, -0.03436934291611867],
            [0.5956129788978138, -0.9357322733337294],
            [-0.20368496482007148, 0.46844786191179816],
        ],
        [
            [-0.06552751820013818, 0.26175788084181584],
            [0.07306438703514838, -0.711444855732456],
            [0.39862763070458984, -0.5741890661477769],
        ],
        [
            [1.323528861572951, -0.35723301174725797],
            [0.48514114992577567, 0.0016611009231209514],
            [0.6734698979561752, -0.4257846424539761],
        ],
        [
            [0.20536845221066047, -0.7098133074292391],
            [-0.31968469608204453, 0.12535205229046198],
            [1.1262690339433434, 1.2848507958926234],
        ],
    ],
    [
        [
            [0.5429187688867072, 0.33103381273563826],
            [1.1609954835567748, -0.26659797373103744],
            [0.392274240819697, 0.3591635900997261],
        ],
        [
            [0.20009194322531246, 0.14739478714429946],
            [0.12878054778656883, -0.42312995586112817],
            [-0.7173370171074697, -0.2803453056437697],
        ],
        [
            [0.417770248145568, 1.068569922200862],
            [0.6909092603553764, 0.7447610675858239],
            [0.5496313729686407, 0.49389894412997476],
        ],
        [
            [0.8925182153634483, -0.7951571651911445],
            [-1.697441496774873, 0.057924904964030355],
            [1.5930469206892246, 2.685025141577642],
        ],
    ],
    [
        [
            [0.17302168598728238, 0.6865799941041433],
            [0.6179152544773172, -0.8030841029420279],
            [1.720730898333257, 1.2556892017659385],
        ],
        [
            [0.12511917962027735, 0.5320952582812983],
            [0.08973855083492659, -0.6251933355584587],
            [-0.07923395759614786, 0.26448766466607504],
        ],
        [
            [0.7889910253964025, 0.5015241226069571],
            [0.0420836334999269, 0.9579845878004636],
            [-0.5379082322574139, 0.5606618678054595],
        ],
        [
            [1.941806999226561, -2.2744993601533974],
            [-0.7595858839262768, -1.0210538374952434],
            [2.7889007369247167, 2.0217645566322515],
        ],
    ],
    [
        [
            [1.094751596736525, -0.7100562901737721],
            [0.001445415756379299, 0.45877323479152926],
            [-0.11150753494870246, -1.6756335897737082],
        ],
        [
            [0.5702566292076637, 1.6350108239523278],
            [0.7101548239805086, -0.648726182315425],
            [-0.29160505203523424, 0.1568516770462494],
        ],
        [
            [1.7600223831085344, 0.436563414251126],
            [0.08036177734395207, 1.1013161966926444],
            [-0.05777188081763779, 1.316180775565924],
        ],
        [
            [0.3787445379314111, -0.5056972130060511],
            [0.819044679877479, 0.8913757692222406],
            [0.21032415943701022, 1.5506507631391409],
        ],
    ],
    [
        [
            [-1.288086032877318, -0.5040663588807479],
            [-0.43178412737644556, -0.37732120621013077],
            [0.4146756321650227, -0.23700987347182034],
        ],
        [
            [0.5569723046154265, 0.05821509890789727],
            [-0.23532959933668757, 0.08354732865166167],
            [0.3031772809914703, 0.6067889818758613],
        ],
        [
            [-0.33764493530973255, -0.16454180174290428],
            [-0.964226854919029, 1.1340748522004485],
            [1.0265653041113734, -0.12645320359994344],
        ],
        [
            [1.5830012349600915, 0.6336863119533345],
            [-0.5219581541321751, 0.23341928363189057],
            [1.234759703020142, 1.7316322427836641],
        ],
    ],
];

/// Solutions `(s, t)` of the start system, each coordinate as `[re, im]`.
pub(super) static SOLUTIONS: [[[f64; 2]; 6]; 64] = [
    [
        [-0.8655500896625061, 0.26699517551507085], [0.7035709840042117, -0.36289423481998917],
        [-0.9397302048611668, -0.04633628665212039], [0.3380055989896134, 0.7765338953483941],
        [-0.859753174387423, -0.914193220348827], [0.49916640695464987, 0.33522922273127426],
    ],
    [
        [1.466511122297198, -0.6420949746127913], [0.3202571316598279, -0.6773000797339209],
        [-1.1637977677299338, 0.4816971698912323], [0.9967597801644525, 0.02108116701227003],
        [0.07667901549338277, 0.361287695065349], [2.8594871827190627, 2.778685121529796],
    ],
    [
        [6.214452163577959, -1.5356957471404202], [2.774549084205901, 0.28499965031308805],
        [3.6669982383543975, 2.8153857237122186], [2.1468455553273023, 0.369145695647641],
        [-0.6043303979581437, 0.7513176500163271], [1.6234992091213347, 3.0993644727695178],
    ],
    [
        [-2.699663519045218, -1.910915182832877], [-3.5048114638635623, -1.7532848931516527],
        [-0.11555893248173453, -0.6952385702233256], [1.4116189544233613, -0.0036598296613111936],
        [-2.634936881721782, 0.02013178612434702], [0.3343533164017173, -0.07878839258514901],
    ],
    [
        [0.4950999919967719, -0.11327634808031285], [0.22929508594382006, -0.2913017582461377],
        [0.07880201990853494, 0.10793188379063914], [3.5338494046732554, -1.2685746887946374],
        [-0.8996857056882972, -0.9272994060470078], [2.898724281197274, 4.042311712961432],
    ],
    [
        [0.32250846298076014, -2.0215261153619775], [1.3758682275992913, -0.08546503156668009],
        [0.8519486099501945, 1.0496684227473538], [7.860574309788976, -28.09975111243659],
        [25.631599653092696, 5.835843775405286], [17.313137159720632, 4.890306180731685],
    ],
    [
        [0.5155980243847713, -0.7015603589319414], [0.7628301165956343, -0.25955624572327335],
        [-0.016198700771229736, 0.0628473157695549], [3.6491244722607754, -0.4718234650178753],
        [-1.5892581697998036, -1.4466927831118868], [2.5551024170209318, 2.907172357159834],
    ],
    [
        [0.6499185438724576, 7.758660822203245], [5.428628474205062, 0.4128201261502421],
        [-4.928067487145573, 5.489577018786936], [3.7176513036939953, -0.22646594458356578],
        [2.1563209417845983, -2.503779928933876], [1.496049874400832, 3.7247847895911015],
    ],
    [
        [0.42792289178557485, 0.2999553408751304], [-0.3866662361938281, -0.32688255150347184],
        [0.056817500671661685, 0.6701400434068094], [8.090152761837684, -3.30704367277818],
        [3.4819328750005347, 3.254642179982454], [3.6180462068110297, 7.279381468370415],
    ],
    [
        [1.817314346576524, 1.077246474247374], [1.4272126627779411, -3.0514161077253723],
        [0.5366162774865295, -0.05065974816552745], [1.3585417371155724, 1.020444000867588],
        [2.4556275269309173, -0.5366659606897738], [-0.2881368960277856, 1.3665461290211536],
    ],
    [
        [2.9265348085920175, 3.1977343993480036], [2.4900990278749546, 0.1307881850331663],
        [-2.9451478473388955, 0.19854183450843135], [-0.5187974772932633, -2.25559671568484],
        [-0.7001408409515808, -1.8779674058363303], [2.4400778433654127, 1.0182850630751965],
    ],
    [
        [2.716586392440112, 0.5597995453250142], [0.4055733409784268, -0.8002317844544439],
        [-1.1699641700639627, -0.6617603642856259], [-0.2570804217324087, 0.15698704838565783],
        [-0.5312083149220409, 0.5323766159365733], [1.487939598454684, 3.5713974515820315],
    ],
    [
        [-0.06102202287435028, -0.16529295184315768], [-1.2786410034694142, -0.581411708772975],
        [-0.96589409619701, 2.4882320490749863], [1.1997995422868346, -0.8961238512519496],
        [-2.275964755339096, -5.478826589963029], [-1.2176148720535367, 3.63718574295822],
    ],
    [
        [3.240307013566059, 1.4885863036266667], [2.034786229966712, -2.4712246928698454],
        [-1.5038701057854709, 3.0679897811939365], [-0.9678136532906224, -7.58295122797983],
        [-3.572897261522554, -2.205655890174622], [6.3816307798970175, -0.8268490882221634],
    ],
    [
        [-1.0136782969797191, -0.2849725230544397], [-0.5132712590727421, 0.8529794713811304],
        [-2.965540654909782, -3.0606417663391], [1.8515016887454556, -4.996627667939596],
        [2.088951102334881, 4.79764021507482], [5.092820480324327, -4.53102423369907],
    ],
    [
        [0.5758521967727934, -0.39946447901509563], [0.3109440076829682, -0.4748435024939665],
        [-0.47666351388803085, 1.0588323069512782], [2.58305645492885, -3.421629732960513],
        [1.0383717133438162, 0.7515219694006049], [5.213582040546715, 2.306992772645831],
    ],
    [
        [0.04343448375462959, -0.31158174059841576], [-0.19450318693479549, -0.4179715843817215],
        [-0.0664139320936472, -0.4009881552601353], [-4.614829246018117, -2.0195016464306668],
        [4.728270637258714, 7.059404097286525], [2.7280347893061703, -7.612177102048553],
    ],
    [
        [0.3053599010220086, 0.38806786226114487], [-0.5844492942810501, -1.1954900159719741],
        [-0.9997976771453136, 0.00418184942166724], [6.481625770836638, -2.515094540629633],
        [-1.9854022569411782, -0.30195521867464303], [3.3392567571811265, 6.781488230301882],
    ],
    [
        [0.2966846184205653, 0.5028083371039856], [-0.32527583008064953, -0.39440497638261285],
        [0.2952440089404761, -0.3777410405386246], [1.2629847448016391, -2.3640206378775734],
        [-6.3379768213457055, -2.7931343652669898], [4.746321759603934, -2.0197422601914194],
    ],
    [
        [-7.129828981750548, -14.355054896756133], [1.87149224609608, -9.05265825475885],
        [12.215030772009257, 1.0374263353850313], [12.460470540160665, -6.328567521839724],
        [10.388084814236032, 3.4462799514979188], [4.443650707314769, 12.983662189700619],
    ],
    [
        [-0.8094181185817441, -1.4927911099740692], [0.8475262589347444, 0.5681155720033064],
        [-1.0189367197102093, -0.9221085831107176], [-5.639346357550132, -0.14871991317958907],
        [1.7491956242264357, 3.6455442464281713], [-0.2805493667863142, -3.2080632685948958],
    ],
    [
        [-1.9858734219146752, -1.3948337477513477], [-0.6593525017662376, 0.3176776266198366],
        [-0.047096686062731596, -2.635918862003639], [3.2551600304144834, -1.97886413386835],
        [-0.849990401827083, -1.2954595004977727], [2.585126137187723, 2.4527535543670127],
    ],
    [
        [0.8557272678911534, -0.25908483482480504], [-1.0020545508565653, -0.2238359499334755],
        [-0.323408100159875, -0.14608540493676042], [-6.140653009792571, 4.046181222262215],
        [-5.715639128207904, 5.771950455521907], [-0.6852722473513083, 2.677450842397089],
    ],
    [
        [-3.0017964791491507, -1.5813790406149943], [3.6484949624896044, -4.291775075369931],
        [2.486283154378213, -1.748098292740957], [8.14728666439394, -7.841951230256424],
        [5.2119454995615335, 4.008393549198768], [7.065984212825627, 5.517623517657372],
    ],
    [
        [0.7443101542235945, -0.47204845733331807], [0.6254922468678754, -0.17152886685993163],
        [-0.21599428537692048, 0.45152503296571644], [1.0140185561100845, -1.0148588330867525],
        [-0.4286504614360485, -1.3066351056681258], [2.565586159649985, 2.5646579822766604],
    ],
    [
        [0.19292516964532505, 1.87966363659928], [0.957275332403036, 0.3705513978437282],
        [0.38904162220403865, 0.017824460465531416], [3.27312029897646, -1.0758702225957542],
        [-3.0878348679732395, -1.6053845331712822], [2.1852671504713843, 0.5709564270124605],
    ],
    [
        [1.2197617267858605, 0.37421379988586106], [-0.48294587407671485, 0.2483763821960067],
        [-0.7592279959150092, 0.8222645608405652], [1.3443479617459981, -0.5240771091375074],
        [-0.3647139901396945, -0.3290379930018192], [1.842020136605853, 2.3653327474554975],
    ],
    [
        [0.48005923388398797, -0.8539087101176147], [0.1528472254767996, -0.10843885834754621],
        [0.18591859322920998, 0.05845855613467031], [-5.535066592102837, -0.009550773109605082],
        [9.537656242020443, -0.35281153965845], [-5.3220925520861275, -6.598142841768093],
    ],
    [
        [-0.5233699747835546, -1.20355994320148], [-0.24331757703019394, 0.5016752653168614],
        [0.30205418441567844, -0.8646809964688628], [10.968420468997378, 26.749013985854948],
        [25.487395375728696, -18.455966373269458], [-17.7942389683035, -10.979699522557896],
    ],
    [
        [-0.7389025859806815, -0.9740796194810007], [-0.5155806029024196, -0.014208309494168314],
        [0.19845030055368812, 0.5296284154665521], [0.3923574544185638, 1.2969056052401453],
        [1.959238870450691, 0.7419041644421186], [-1.8485831281662635, 0.650300071521922],
    ],
    [
        [-0.18833110251320942, -0.42678483405818235], [-0.8776759182637526, 0.45503503454203964],
        [-0.48619190188302486, 0.8799861885256183], [-2.0674381521055913, 0.7558292692110049],
        [0.34510836103129244, 0.4360424932046582], [-2.5763960449139685, 1.4840608222352976],
    ],
    [
        [-1.5792125953022844, 0.44127194084665894], [-0.21720765186406205, -2.370914464131395],
        [0.8663636223079721, 0.05383589030216475], [7.7118695652014635, -3.9402546846636524],
        [6.155238201588214, 6.6798104861167324], [1.6735931977805425, 7.190514288668929],
    ],
    [
        [-0.2638189717997752, -0.026087824883604453], [-0.07719248880928004, -0.7051109582002557],
        [0.24517378843819823, 0.42092168251870743], [2.2390171007170387, -4.443231893747013],
        [3.054440925318165, 0.9932481683426004], [4.519500903211183, 3.2159311277179596],
    ],
    [
        [1.2966422949002223, -1.4739495769697544], [0.321478468439301, 2.717917081622149],
        [0.27707195172412813, 5.033348091574608], [-0.206466486257071, -0.9314606282972778],
        [-1.225226333772563, -0.421150645393269], [1.9556492418882474, 0.3238470752259568],
    ],
    [
        [-0.5886904801841197, -0.13944370844839898], [-0.12524912152689865, -1.0404619309714993],
        [0.6303509449074005, -0.24692673888224875], [-0.8558887895392502, -5.236026339907006],
        [0.05645300590309897, -2.264629966763137], [9.748590189393664, 0.36776971958903065],
    ],
    [
        [1.6777209756687703, -1.3781607554380266], [2.119583965453113, -2.960543967238501],
        [0.7363155006881992, -0.08631981063339839], [2.7749436688530347, 0.15608334710784535],
        [-1.4634170935499744, 0.38760256327028064], [1.834064538054571, 1.2861824229965673],
    ],
    [
        [0.8860582058104792, 0.005611866528891347], [-0.03352141115233075, -0.4351375230787555],
        [0.5298534849281954, 0.944647122789817], [4.8778517888532535, 2.4940457337385085],
        [-0.988531649783664, 2.4524993101205705], [-1.766446100038179, 5.151749600302871],
    ],
    [
        [-1.2560546707145235, 0.1500490437864549], [-0.11894720419674254, -0.17123302421280423],
        [0.758815436492423, 0.018390983799856445], [1.0770750142928978, -0.6428161545346197],
        [0.36321163056592437, 0.8686508670485145], [0.7477042240159477, 3.0305849175747333],
    ],
    [
        [0.6665407194047245, 1.3355852977100797], [0.02989238458498195, -0.06957379541326605],
        [0.1885719972228022, 1.7142863791814793], [1.0739983615490298, -1.3967448856204607],
        [1.5815065977249474, -1.3514778864144776], [1.8481496704344333, 4.025684571703161],
    ],
    [
        [0.9867275109771781, 5.344747970652443], [-1.325881223419177, -1.1393881317087546],
        [4.844311113646924, -2.911400738854191], [-4.028124227955062, 20.043837136975768],
        [2.0996533663589165, -10.101735265760388], [22.75421741340265, 8.891906405287095],
    ],
    [
        [1.7991828275755726, 0.5352614903525631], [0.8891905720722074, -2.2149003501390405],
        [0.3506211300955908, -0.511671504313637], [6.143002298798783, 2.0104056471148755],
        [2.197591080964262, -5.366011382669669], [0.8198370464001185, 3.1120875291134347],
    ],
    [
        [0.9272644924080226, -0.46917784588065986], [0.4863891994855509, -1.0794232547296276],
        [-0.14394090172934346, 0.4727505552221287], [1.033847275855663, -0.8793908509831617],
        [-1.6428590672490264, 0.19297760164719657], [2.796788969473251, 2.3995731308107113],
    ],
    [
        [0.4596624169709707, 0.05822464196358907], [0.48032503295800155, -0.6333841203411135],
        [-0.5101417150136061, 1.4810176611376245], [5.890991085491058, -9.679688651026456],
        [6.224010072304536, 1.695618681088607], [9.448331091353934, 4.295760781816521],
    ],
    [
        [2.8673209708216056, 5.1766778804012485], [4.8281594334652755, 5.557001396644457],
        [-1.6063308970654844, -2.9827624510794744], [3.2671672844498656, -2.0388522142738745],
        [-0.34396034987952173, -2.9402079525442364], [4.152530867956612, 0.2007972275549923],
    ],
    [
        [0.1066671007306105, -0.15313017603633466], [0.2063444966928972, -1.1222163081363457],
        [0.4163019902513279, 0.9226677308262015], [-1.6940103206190695, 4.532508009337955],
        [-4.423032329492005, -0.4653122410652627], [-1.5503906473635043, 0.06215320851257321],
    ],
    [
        [0.018241900121880823, -0.22743097362600317], [0.2248512078740428, -0.5005605925595109],
        [0.6171304508032953, -0.15164861580732972], [1.1816380589426831, 1.6968251639276843],
        [-1.6850530930054237, 0.5351756905036996], [2.04404248764629, 5.199647048916696],
    ],
    [
        [-1.1101621426754245, -1.2370239116349884], [0.05215160461359453, 0.010537952873583254],
        [-0.7387538848368624, -0.9565744248046096], [3.091056912854699, -17.48068785691312],
        [-6.0531319532980765, -1.4362710630178108], [5.269880175807211, -1.8991121091854586],
    ],
    [
        [0.41871130693648634, -0.26692769382738524], [0.321786305080463, -0.3108612144082794],
        [0.030702742699187668, -0.15159489513016136], [7.340413282805532, -4.927049386465037],
        [-3.0003117152929697, -1.1798723430454625], [4.648767783189683, 4.299254297404821],
    ],
    [
        [0.4639794598670234, 0.06553168705888374], [0.2564104174868322, -0.002403898467114745],
        [-0.3332728589033602, -0.20255016300563444], [-0.6155307507351492, -2.8097273786736277],
        [0.10081834945901073, 1.1209778999478677], [1.9572634140604654, 2.1545775054180196],
    ],
    [
        [1.0829894288874156, 0.1460895230985523], [-0.3084561145454839, -0.4636335824643363],
        [-1.0807540163984406, 0.35422957063748606], [1.5815693290147324, -0.0023577225697086275],
        [0.4919192947798674, -0.6298773625609378], [1.3140880259174084, 2.3234712002670266],
    ],
    [
        [4.633230184467058, 0.7092629881549973], [0.1549822290962797, 2.9190044234074373],
        [-3.476764216256367, 1.8160758954030614], [5.617041609179776, 0.2168141337272462],
        [1.6475534181633977, 5.164541701634008], [-0.8329992683627905, 4.4069326892874265],
    ],
    [
        [0.250964088116592, 0.1036174641003204], [-0.07689305146603813, -0.4483706415714296],
        [0.1302751593930525, 0.38950667204861206], [5.4881953692345045, -6.939692310580777],
        [3.969614308571251, -0.936897279814559], [7.225516313383082, 6.550896426133698],
    ],
    [
        [-2.8641624381861868, -0.5505887475599296], [-0.4416999730978678, -1.7062931470744478],
        [-0.8580439935976497, -1.0514085744368071], [-0.2766114915659205, 4.691081716927855],
        [-3.497613881531596, -0.4355354269788268], [-1.4630206116751028, 2.7639977238186235],
    ],
    [
        [0.4204379044678524, -0.3852051617650018], [0.07327612262277901, -0.7109644518033513],
        [-0.35857254694308766, -0.50994524786878], [-37.34939409399477, -2.633108253794303],
        [11.647465943735643, 42.081439972322116], [25.462966152394007, -18.087441136208934],
    ],
    [
        [0.08792613194462973, 0.009792946516080646], [0.444594418844007, -0.39954935619907855],
        [0.8082851717249835, 0.4290378153162199], [0.3830239767715749, -0.27240566048471887],
        [-2.16142011667528, -1.251104765817391], [2.4358657968764033, 2.8979049029380546],
    ],
    [
        [-0.045816057999390966, -0.15988524015387057], [0.37407775225114753, -0.13845084728155208],
        [1.090151686502176, 1.1519431579936847], [1.3220430059111177, -0.011607453325708348],
        [-2.874980505796849, -0.23374486131885192], [1.535410992837177, 2.1083823640168067],
    ],
    [
        [-0.2684477357059529, -0.4895812798380223], [-0.20052998254965657, 0.14261240692238306],
        [0.3046896449116613, -0.9281056697188277], [7.648202060841656, -15.997177823898989],
        [-19.054734318847494, -7.27125658992293], [1.3415124733792105, 9.17860079482987],
    ],
    [
        [0.558863341419992, -0.2738140563939558], [-0.5796327120057305, -0.3528760009862519],
        [0.9879435567610545, -0.38304555584328687], [1.4384767861880707, 0.4892807999184217],
        [-4.107449925633715, -0.7347768627852056], [-0.3809157183599147, 1.5837926496813188],
    ],
    [
        [-1.022950991570213, 0.5390508135730396], [-0.22927400117949948, 0.33421625185406784],
        [-0.27112688655734235, -0.999933261867421], [-2.2164949344096407, -3.1139994086672673],
        [-3.7195444494512118, 1.1762932183845403], [1.6596619810617115, -1.6877631413220664],
    ],
    [
        [-1.286854448240169, -0.8640599426633113], [0.12807833005720115, 0.36537506190814467],
        [-0.2719253295238321, -1.879627534752062], [6.949799161349465, 1.5037946450641375],
        [-1.3064720216252315, -4.792928591257466], [-0.48044676935529307, 5.38140637272511],
    ],
    [
        [-0.40449792872439094, 0.27476787963533356], [0.0326413469977554, -0.6919719589521393],
        [0.04826912166398071, 0.43575957625605183], [6.488256392866844, 3.3758554457487264],
        [-1.999885500172364, 6.223312633655371], [-2.273493289865099, 3.7892458940769673],
    ],
    [
        [0.44010891692225657, -1.0824559378030822], [1.0675196848363342, -0.2595849176385421],
        [-0.4374715810866352, -0.25121635493222016], [3.456944981954522, -3.5062638430576176],
        [-1.5046429491833966, -5.151715777583303], [0.5315969228999475, 2.296408114707014],
    ],
    [
        [-1.8674053859754458, -0.8104451201716316], [-1.6814052567363946, -3.7347454507349016],
        [5.173556822192984, 1.010302778365435], [1.7699068665753395, 2.114062000188854],
        [-0.9259219224421761, 2.447473132878385], [1.6920449299812357, 1.562151760641761],
    ],
    [
        [-0.22407374524704046, 0.5966530832328978], [-0.1634704164657642, 1.592313076016394],
        [-0.7627615519865236, 0.16277856227784365], [13.516616952240808, -8.986152544668572],
        [-18.933810945235045, 12.407566167460695], [-14.059002721421823, -22.217290635656074],
    ],
];
